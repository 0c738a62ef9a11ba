use newsletter_signup::configuration::get_configuration;
use newsletter_signup::startup::build;
use newsletter_signup::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let subscriber = get_subscriber("newsletter-signup".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber);

    let config = get_configuration()?;
    let app = build(config).await?;
    app.run().await?;

    Ok(())
}
