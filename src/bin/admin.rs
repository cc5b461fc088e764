use std::collections::VecDeque;
use std::io::BufRead;
use std::sync::Arc;

use chrono::Duration;
use sqlx::postgres::PgPoolOptions;

use admin_auth::auth::{CredentialHasher, CredentialService, JwtConfig, TokenService};
use admin_auth::infra::PgPrincipalStore;

fn print_help() {
    eprintln!(
        "\
admin-auth-admin

USAGE:
  admin-auth-admin <command> [options]

COMMANDS:
  migrate                         Create the administrators table
  create-admin                    Register an administrator directly in the database
  hash-secret                     Hash a secret read from stdin
  issue-token                     Issue a bearer token for a subject
  verify-token                    Validate a bearer token and print its subject

COMMON OPTIONS:
  --database-url <postgres_url>    (defaults to env DATABASE_URL)

create-admin OPTIONS:
  --identity-key <email>          (required)
  --display-name <name>           (required)
  secret is read from the first line of stdin

issue-token OPTIONS:
  --subject <email>               (required)
  --lifetime-ms <n>               (optional; defaults to JWT_EXPIRATION_MS)

verify-token OPTIONS:
  --token <jwt>                   (required)

ENV:
  JWT_SECRET, JWT_EXPIRATION_MS, HASH_MEMORY_KIB, HASH_ITERATIONS
"
    );
}

fn require_database_url(database_url: Option<String>) -> anyhow::Result<String> {
    database_url
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is required (or pass --database-url)"))
}

fn require_value(args: &mut VecDeque<String>, flag: &str) -> anyhow::Result<String> {
    args.pop_front()
        .ok_or_else(|| anyhow::anyhow!("missing value for {flag}"))
}

/// Read a secret from the first line of stdin
fn read_secret() -> anyhow::Result<String> {
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let secret = line.trim_end_matches(['\r', '\n']).to_string();
    if secret.is_empty() {
        anyhow::bail!("expected a secret on stdin");
    }
    Ok(secret)
}

async fn connect_store(database_url: Option<String>) -> anyhow::Result<PgPrincipalStore> {
    let database_url = require_database_url(database_url)?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;
    Ok(PgPrincipalStore::new(pool))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args: VecDeque<String> = std::env::args().skip(1).collect();
    let Some(command) = args.pop_front() else {
        print_help();
        return Ok(());
    };

    if matches!(command.as_str(), "-h" | "--help" | "help") {
        print_help();
        return Ok(());
    }

    match command.as_str() {
        "migrate" => {
            let mut database_url: Option<String> = None;
            while let Some(arg) = args.pop_front() {
                match arg.as_str() {
                    "--database-url" => {
                        database_url = Some(require_value(&mut args, "--database-url")?);
                    }
                    "-h" | "--help" => {
                        print_help();
                        return Ok(());
                    }
                    other => anyhow::bail!("unexpected argument: {other}"),
                }
            }

            let store = connect_store(database_url).await?;
            store.initialize().await?;
            println!("ok: administrators table ready");
            Ok(())
        }
        "create-admin" => {
            let mut database_url: Option<String> = None;
            let mut identity_key: Option<String> = None;
            let mut display_name: Option<String> = None;

            while let Some(arg) = args.pop_front() {
                match arg.as_str() {
                    "--database-url" => {
                        database_url = Some(require_value(&mut args, "--database-url")?);
                    }
                    "--identity-key" => {
                        identity_key = Some(require_value(&mut args, "--identity-key")?);
                    }
                    "--display-name" => {
                        display_name = Some(require_value(&mut args, "--display-name")?);
                    }
                    "-h" | "--help" => {
                        print_help();
                        return Ok(());
                    }
                    other => anyhow::bail!("unexpected argument: {other}"),
                }
            }

            let identity_key =
                identity_key.ok_or_else(|| anyhow::anyhow!("--identity-key is required"))?;
            let display_name =
                display_name.ok_or_else(|| anyhow::anyhow!("--display-name is required"))?;
            let secret = read_secret()?;

            let store = connect_store(database_url).await?;
            store.initialize().await?;

            let service = CredentialService::new(
                Arc::new(store),
                Arc::new(CredentialHasher::from_env()?),
            );
            let principal = service
                .register(&identity_key, &display_name, &secret)
                .await?;

            println!("ok: created {} ({})", principal.identity_key, principal.id);
            Ok(())
        }
        "hash-secret" => {
            if let Some(other) = args.pop_front() {
                if matches!(other.as_str(), "-h" | "--help") {
                    print_help();
                    return Ok(());
                }
                anyhow::bail!("unexpected argument: {other}");
            }

            let secret = read_secret()?;
            let hash = CredentialHasher::from_env()?.hash(&secret)?;
            println!("{hash}");
            Ok(())
        }
        "issue-token" => {
            let mut subject: Option<String> = None;
            let mut lifetime_ms: Option<i64> = None;

            while let Some(arg) = args.pop_front() {
                match arg.as_str() {
                    "--subject" => {
                        subject = Some(require_value(&mut args, "--subject")?);
                    }
                    "--lifetime-ms" => {
                        lifetime_ms = Some(require_value(&mut args, "--lifetime-ms")?.parse()?);
                    }
                    "-h" | "--help" => {
                        print_help();
                        return Ok(());
                    }
                    other => anyhow::bail!("unexpected argument: {other}"),
                }
            }

            let subject = subject.ok_or_else(|| anyhow::anyhow!("--subject is required"))?;

            let mut config = JwtConfig::from_env()?;
            if let Some(ms) = lifetime_ms {
                config.lifetime = Duration::try_milliseconds(ms)
                    .ok_or_else(|| anyhow::anyhow!("--lifetime-ms out of range: {ms}"))?;
            }

            let issued = TokenService::new(&config)?.issue(&subject)?;
            println!("{}", issued.token);
            eprintln!("expires_at: {}", issued.expires_at.to_rfc3339());
            Ok(())
        }
        "verify-token" => {
            let mut token: Option<String> = None;

            while let Some(arg) = args.pop_front() {
                match arg.as_str() {
                    "--token" => {
                        token = Some(require_value(&mut args, "--token")?);
                    }
                    "-h" | "--help" => {
                        print_help();
                        return Ok(());
                    }
                    other => anyhow::bail!("unexpected argument: {other}"),
                }
            }

            let token = token.ok_or_else(|| anyhow::anyhow!("--token is required"))?;
            let service = TokenService::new(&JwtConfig::from_env()?)?;

            match service.validate(&token) {
                Ok(subject) => {
                    println!("ok: subject={subject}");
                    Ok(())
                }
                Err(reason) => anyhow::bail!("invalid token: {reason}"),
            }
        }
        other => {
            print_help();
            anyhow::bail!("unknown command: {other}")
        }
    }
}
