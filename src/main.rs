use anyhow::Result;
use slow_relay::{
    Flow, RelaySettings, Session, dispatch::TcpConnector, input::LineReader, logging,
    sink::PacedSink,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let settings = RelaySettings::from_env();
    info!(
        "Relay starting with config {}",
        settings.config_path.display()
    );

    let mut connector = TcpConnector::new(settings.connection_timeout)?;
    let mut sink = PacedSink::new(tokio::io::stdout(), settings.output_delay);
    let mut lines = LineReader::new(tokio::io::stdin(), settings.line_timeout);

    loop {
        let mut session = Session::open(settings.clone(), sink, connector).await;
        let flow = session.run(&mut lines).await?;
        (sink, connector) = session.into_parts();
        if flow != Flow::Reset {
            break;
        }
        info!("Restarting relay session");
    }

    info!("Relay stopped");
    Ok(())
}
