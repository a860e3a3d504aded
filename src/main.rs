//! pool-gateway - command-line driver for the gateway facade
//!
//! ```bash
//! pool-gateway mb photos --attr user.rgw.acl=private
//! pool-gateway put photos 2024/cat.jpg ./cat.jpg
//! pool-gateway ls photos --prefix 2024/ --delimiter /
//! pool-gateway get photos 2024/cat.jpg --range 0-99 > head.bin
//! ```

use anyhow::{anyhow, Context};
use bytes::Bytes;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pool_gateway::use_cases::{
    ByteRange, CopyObjectRequest, GetObjectRequest, ListObjectsRequest, PutObjectRequest,
};
use pool_gateway::value_objects::{AttrMap, Preconditions};
use pool_gateway::{Config, Gateway, GatewayBuilder, GatewayError};

#[derive(Debug, Parser)]
#[command(name = "pool-gateway", version, about = "Bucket and object access over pools")]
struct Cli {
    /// TOML configuration file; environment variables are used when absent
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create a bucket
    Mb {
        bucket: String,
        #[arg(long = "attr", value_parser = parse_attr)]
        attrs: Vec<(String, Bytes)>,
        #[arg(long)]
        owner: Option<u64>,
    },
    /// Delete a bucket and every object in it
    Rb { bucket: String },
    /// List buckets, or objects in a bucket
    Ls {
        bucket: Option<String>,
        #[arg(long, default_value = "")]
        prefix: String,
        #[arg(long, default_value = "")]
        delimiter: String,
        #[arg(long, default_value = "")]
        marker: String,
        #[arg(long, default_value_t = -1, allow_hyphen_values = true)]
        max: i64,
    },
    /// Upload a file ("-" reads stdin)
    Put {
        bucket: String,
        key: String,
        file: PathBuf,
        #[arg(long = "attr", value_parser = parse_attr)]
        attrs: Vec<(String, Bytes)>,
    },
    /// Write an object (or a byte range of it) to stdout
    Get {
        bucket: String,
        key: String,
        /// Inclusive range `start-end`; an open end reads to the end
        #[arg(long, value_parser = parse_range)]
        range: Option<ByteRange>,
        /// Only succeed if the stored etag matches
        #[arg(long)]
        if_match: Option<String>,
        #[arg(long)]
        if_none_match: Option<String>,
    },
    /// Copy an object with its attributes
    Cp {
        src_bucket: String,
        src_key: String,
        dst_bucket: String,
        dst_key: String,
        #[arg(long = "attr", value_parser = parse_attr)]
        attrs: Vec<(String, Bytes)>,
    },
    /// Delete an object
    Rm { bucket: String, key: String },
    /// Print one attribute; an empty key addresses the bucket
    Getattr {
        bucket: String,
        key: String,
        name: String,
    },
    /// Set one attribute; an empty key addresses the bucket
    Setattr {
        bucket: String,
        key: String,
        name: String,
        value: String,
    },
    /// Print size, modification time and attributes of an object
    Stat { bucket: String, key: String },
}

fn parse_attr(raw: &str) -> Result<(String, Bytes), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got {}", raw))?;
    if name.is_empty() {
        return Err("attribute name cannot be empty".to_string());
    }
    Ok((name.to_string(), Bytes::copy_from_slice(value.as_bytes())))
}

fn parse_range(raw: &str) -> Result<ByteRange, String> {
    let (start, end) = raw
        .split_once('-')
        .ok_or_else(|| format!("expected START-END, got {}", raw))?;
    let offset = start
        .parse::<u64>()
        .map_err(|e| format!("invalid range start: {}", e))?;
    let end = if end.is_empty() {
        -1
    } else {
        end.parse::<i64>()
            .map_err(|e| format!("invalid range end: {}", e))?
    };
    Ok(ByteRange::new(offset, end))
}

/// Attach the protocol descriptor to a gateway failure
fn report(err: GatewayError) -> anyhow::Error {
    anyhow!("{} ({})", err, err.descriptor())
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::from_file(path).map_err(|e| anyhow!(e))?,
        None => Config::from_env(),
    };
    config.validate().map_err(|e| anyhow!(e))?;
    Ok(config)
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    if json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init();
    }
}

async fn read_input(file: &PathBuf) -> anyhow::Result<Bytes> {
    if file.as_os_str() == "-" {
        let mut buffer = Vec::new();
        tokio::io::stdin().read_to_end(&mut buffer).await?;
        return Ok(Bytes::from(buffer));
    }
    let data = tokio::fs::read(file)
        .await
        .with_context(|| format!("cannot read {}", file.display()))?;
    Ok(Bytes::from(data))
}

fn print_attrs(attrs: &AttrMap) {
    for (name, value) in attrs {
        println!("  {} = {}", name, String::from_utf8_lossy(value));
    }
}

async fn run(gateway: &Gateway, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Mb {
            bucket,
            attrs,
            owner,
        } => {
            let attrs: AttrMap = attrs.into_iter().collect();
            gateway
                .create_bucket(&bucket, &attrs, owner)
                .await
                .map_err(report)?;
        }
        Command::Rb { bucket } => gateway.delete_bucket(&bucket).await.map_err(report)?,
        Command::Ls {
            bucket: None, ..
        } => {
            for entry in gateway.list_buckets().await.map_err(report)? {
                println!("{}", entry.name);
            }
        }
        Command::Ls {
            bucket: Some(bucket),
            prefix,
            delimiter,
            marker,
            max,
        } => {
            let request = ListObjectsRequest::new(bucket)
                .with_prefix(prefix)
                .with_delimiter(delimiter)
                .with_marker(marker)
                .with_max(max);
            let response = gateway.list_objects(&request).await.map_err(report)?;
            for prefix in &response.common_prefixes {
                println!("{:>10}  {:<25}  {:<32}  {}", "PRE", "", "", prefix);
            }
            for entry in &response.results {
                println!(
                    "{:>10}  {:<25}  {:<32}  {}",
                    entry.size,
                    entry.mtime.to_rfc3339(),
                    entry.etag,
                    entry.name
                );
            }
        }
        Command::Put {
            bucket,
            key,
            file,
            attrs,
        } => {
            let data = read_input(&file).await?;
            let mtime = gateway
                .put_object(PutObjectRequest {
                    bucket,
                    key,
                    data,
                    attrs: attrs.into_iter().collect(),
                    want_mtime: true,
                })
                .await
                .map_err(report)?;
            if let Some(mtime) = mtime {
                println!("{}", mtime.to_rfc3339());
            }
        }
        Command::Get {
            bucket,
            key,
            range,
            if_match,
            if_none_match,
        } => {
            let request = GetObjectRequest::new(bucket, key)
                .with_range(range.unwrap_or_default())
                .with_preconditions(Preconditions {
                    if_match,
                    if_none_match,
                    ..Default::default()
                });
            let output = gateway.get_object(&request).await.map_err(report)?;
            debug!(size = output.size, len = output.len(), "Object fetched");
            if let Some(data) = output.data {
                let mut stdout = tokio::io::stdout();
                stdout.write_all(&data).await?;
                stdout.flush().await?;
            }
        }
        Command::Cp {
            src_bucket,
            src_key,
            dst_bucket,
            dst_key,
            attrs,
        } => {
            gateway
                .copy_object(CopyObjectRequest {
                    src_bucket,
                    src_key,
                    dst_bucket,
                    dst_key,
                    preconditions: Preconditions::default(),
                    attrs: attrs.into_iter().collect(),
                })
                .await
                .map_err(report)?;
        }
        Command::Rm { bucket, key } => gateway.delete_object(&bucket, &key).await.map_err(report)?,
        Command::Getattr { bucket, key, name } => {
            let value = gateway.get_attr(&bucket, &key, &name).await.map_err(report)?;
            println!("{}", String::from_utf8_lossy(&value));
        }
        Command::Setattr {
            bucket,
            key,
            name,
            value,
        } => {
            gateway
                .set_attr(&bucket, &key, &name, Bytes::from(value))
                .await
                .map_err(report)?;
        }
        Command::Stat { bucket, key } => {
            let output = gateway
                .get_object(&GetObjectRequest::head(bucket, key))
                .await
                .map_err(report)?;
            println!("size:  {}", output.size);
            println!("mtime: {}", output.mtime.to_rfc3339());
            if let Some(attrs) = &output.attrs {
                println!("attrs:");
                print_attrs(attrs);
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;
    init_tracing(config.log_json);

    let gateway = GatewayBuilder::new(config)
        .with_configured_store()
        .await
        .map_err(report)?
        .build()
        .await
        .map_err(report)?;

    run(&gateway, cli.command).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_attr() {
        let (name, value) = parse_attr("user.color=blue=ish").unwrap();
        assert_eq!(name, "user.color");
        assert_eq!(value, Bytes::from_static(b"blue=ish"));
        assert!(parse_attr("novalue").is_err());
        assert!(parse_attr("=x").is_err());
    }

    #[test]
    fn test_parse_range() {
        assert_eq!(parse_range("0-99").unwrap(), ByteRange::new(0, 99));
        assert_eq!(parse_range("10-").unwrap(), ByteRange::new(10, -1));
        assert!(parse_range("x-1").is_err());
        assert!(parse_range("5").is_err());
    }

    #[test]
    fn test_cli_parses_listing_flags() {
        let cli = Cli::parse_from([
            "pool-gateway",
            "ls",
            "photos",
            "--prefix",
            "2024/",
            "--delimiter",
            "/",
            "--max",
            "10",
        ]);
        match cli.command {
            Command::Ls {
                bucket, prefix, max, ..
            } => {
                assert_eq!(bucket.as_deref(), Some("photos"));
                assert_eq!(prefix, "2024/");
                assert_eq!(max, 10);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
