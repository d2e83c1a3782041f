use std::error::Error;
use std::path::PathBuf;

use client::config::{BenchConfig, BenchSettings, ConfigError};

#[derive(Debug, Clone)]
pub struct OpContext {
    /// Optional bench.toml; flags and env vars are layered on top
    pub config_path: Option<PathBuf>,
    pub overrides: BenchSettings,
}

impl OpContext {
    pub fn new(config_path: Option<PathBuf>, overrides: BenchSettings) -> Self {
        Self {
            config_path,
            overrides,
        }
    }

    /// Config file settings merged with overrides, nothing validated yet
    pub fn settings(&self) -> Result<BenchSettings, ConfigError> {
        let file = match &self.config_path {
            Some(path) => BenchSettings::load(path)?,
            None => BenchSettings::default(),
        };
        Ok(file.merge(self.overrides.clone()))
    }

    pub fn config(&self) -> Result<BenchConfig, ConfigError> {
        self.settings()?.resolve()
    }
}

#[async_trait::async_trait]
pub trait Op: Send + Sync {
    type Error: Error + Send + Sync + 'static;
    type Output;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error>;
}

#[macro_export]
macro_rules! command_enum {
    ($(($variant:ident, $type:ty)),* $(,)?) => {
        #[derive(Subcommand, Debug, Clone)]
        pub enum Command {
            $($variant($type),)*
        }

        #[derive(Debug)]
        pub enum OpOutput {
            $($variant(<$type as $crate::cli::op::Op>::Output),)*
        }

        #[derive(Debug, thiserror::Error)]
        pub enum OpError {
            $(
                #[error(transparent)]
                $variant(<$type as $crate::cli::op::Op>::Error),
            )*
        }

        #[async_trait::async_trait]
        impl $crate::cli::op::Op for Command {
            type Output = OpOutput;
            type Error = OpError;

            async fn execute(&self, ctx: &$crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
                match self {
                    $(
                        Command::$variant(op) => {
                            op.execute(ctx).await
                                .map(OpOutput::$variant)
                                .map_err(OpError::$variant)
                        },
                    )*
                }
            }
        }

        impl std::fmt::Display for OpOutput {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        OpOutput::$variant(output) => write!(f, "{}", output),
                    )*
                }
            }
        }
    };
}
