//! admin-auth server binary.

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    admin_auth::server::run().await
}
