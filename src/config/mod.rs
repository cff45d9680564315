// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Service configuration
//!
//! Every option can be given as a flag or through the environment (a `.env`
//! file is honoured by the binary).

use crate::api::{
    ApiConfig, AuthConfig, RequestLimits, DEFAULT_MAX_BATCH_SIZE, DEFAULT_PORT,
    DEFAULT_SHUTDOWN_TIMEOUT_SECS,
};
use crate::embeddings::{ModelSource, OnnxModelOptions, DEFAULT_INTRA_THREADS, MODEL_NAME};
use anyhow::{bail, Result};
use clap::Parser;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Embedding service configuration
#[derive(Parser, Clone)]
#[command(name = "embedding-service")]
#[command(version)]
#[command(about = "Serves text embeddings from one pre-loaded model over HTTP", long_about = None)]
pub struct ServiceConfig {
    /// Address to bind
    #[arg(long, env = "EMBEDDING_HTTP_HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// TCP port to listen on
    #[arg(long, env = "EMBEDDING_HTTP_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Shared secret required as `Authorization: Bearer <token>`; unset means open
    #[arg(long, env = "EMBEDDING_AUTH_TOKEN", hide_env_values = true)]
    pub auth_token: Option<String>,

    /// Directory with model.onnx and tokenizer.json (skips the hub download)
    #[arg(long, env = "EMBEDDING_MODEL_DIR")]
    pub model_dir: Option<PathBuf>,

    /// Cache directory for hub downloads
    #[arg(long, env = "EMBEDDING_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Maximum number of texts accepted by /embed/batch
    #[arg(long, env = "EMBEDDING_MAX_BATCH_SIZE", default_value_t = DEFAULT_MAX_BATCH_SIZE)]
    pub max_batch_size: usize,

    /// ONNX Runtime intra-op threads
    #[arg(long, env = "EMBEDDING_INTRA_THREADS", default_value_t = DEFAULT_INTRA_THREADS)]
    pub intra_threads: usize,

    /// Seconds to wait for in-flight requests on shutdown
    #[arg(
        long,
        env = "EMBEDDING_SHUTDOWN_TIMEOUT_SECS",
        default_value_t = DEFAULT_SHUTDOWN_TIMEOUT_SECS
    )]
    pub shutdown_timeout_secs: u64,
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .field("model_dir", &self.model_dir)
            .field("cache_dir", &self.cache_dir)
            .field("max_batch_size", &self.max_batch_size)
            .field("intra_threads", &self.intra_threads)
            .field("shutdown_timeout_secs", &self.shutdown_timeout_secs)
            .finish()
    }
}

impl ServiceConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_batch_size == 0 {
            bail!("max_batch_size must be greater than 0");
        }
        if self.intra_threads == 0 {
            bail!("intra_threads must be greater than 0");
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            listen_addr: self.listen_addr(),
            auth: AuthConfig::new(self.auth_token.as_deref()),
            limits: RequestLimits {
                max_batch_size: self.max_batch_size,
            },
            shutdown_timeout: self.shutdown_timeout(),
        }
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    pub fn model_source(&self) -> ModelSource {
        match &self.model_dir {
            Some(dir) => ModelSource::LocalDir(dir.clone()),
            None => ModelSource::Hub {
                repo_id: MODEL_NAME.to_string(),
                cache_dir: self.cache_dir.clone(),
            },
        }
    }

    pub fn onnx_options(&self) -> OnnxModelOptions {
        OnnxModelOptions {
            intra_threads: self.intra_threads,
        }
    }
}
