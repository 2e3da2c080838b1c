use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, warn};

use crate::{
    command::{Command, ConfigCommand, help_lines, split_header},
    config::ConfigStore,
    dispatch::{Connector, Target, build_request, exchange},
    error::RelayError,
    filter::FilterSelection,
    input::LineReader,
    request::{Header, RequestState},
    sink::PacedSink,
    state::RelaySettings,
    template,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Reset,
    Exit,
}

/// One relay session: the request under construction, the persisted
/// configuration and the output channel, driven one line at a time.
pub struct Session<C, W> {
    request: RequestState,
    store: ConfigStore,
    sink: PacedSink<W>,
    connector: C,
    settings: RelaySettings,
    markers: bool,
}

impl<C, W> Session<C, W>
where
    C: Connector,
    W: AsyncWrite + Unpin,
{
    pub fn new(
        store: ConfigStore,
        sink: PacedSink<W>,
        connector: C,
        settings: RelaySettings,
    ) -> Self {
        Self {
            request: RequestState::default(),
            store,
            sink,
            connector,
            settings,
            markers: false,
        }
    }

    pub async fn open(settings: RelaySettings, mut sink: PacedSink<W>, connector: C) -> Self {
        let store = ConfigStore::load(settings.config_path.clone()).await;
        sink.set_delay(store.delay().unwrap_or(settings.output_delay));
        debug!("Output delay set to {:?}", sink.delay());
        Self::new(store, sink, connector, settings)
    }

    pub fn request(&self) -> &RequestState {
        &self.request
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn sink(&self) -> &PacedSink<W> {
        &self.sink
    }

    pub fn markers_enabled(&self) -> bool {
        self.markers
    }

    pub fn into_parts(self) -> (PacedSink<W>, C) {
        (self.sink, self.connector)
    }

    /// # Errors
    /// Input read failures and output channel failures.
    pub async fn run<R: AsyncRead + Unpin>(
        &mut self,
        lines: &mut LineReader<R>,
    ) -> Result<Flow, RelayError> {
        while let Some(line) = lines.next_line().await? {
            if self.handle_line(&line).await? == Flow::Reset {
                return Ok(Flow::Reset);
            }
        }
        info!("Command channel closed");
        Ok(Flow::Exit)
    }

    /// # Errors
    /// Only output channel failures; every other error is reported on the
    /// channel as a diagnostic line.
    pub async fn handle_line(&mut self, line: &str) -> Result<Flow, RelayError> {
        let flow = match self.execute(Command::parse(line)).await {
            Ok(flow) => flow,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!("Command failed: {e}");
                self.sink.println(&e.diagnostic()).await?;
                Flow::Continue
            }
        };
        self.sink.flush().await?;
        Ok(flow)
    }

    async fn execute(&mut self, command: Command<'_>) -> Result<Flow, RelayError> {
        match command {
            Command::Empty => {}
            Command::Help => self.print_lines(&help_lines()).await?,
            Command::Config(config) => self.configure(config).await?,
            Command::Markers(enabled) => self.markers = enabled,
            Command::Connectivity => self.report_connectivity().await?,
            Command::Reset => return Ok(Flow::Reset),
            Command::Target { method, url } => {
                self.request.method = method;
                self.request.url = self.substitute(url).await?;
            }
            Command::Header(raw) => self.add_header(raw).await?,
            Command::Body(body) => self.request.body = body.to_string(),
            Command::Filter(name) => self.request.filter = FilterSelection::from_name(name),
            Command::Send => self.send().await?,
            Command::Show => {
                let lines = self.request.describe();
                self.print_lines(&lines).await?;
            }
            Command::Clear => self.request.clear(),
            Command::Unknown(command) => {
                return Err(RelayError::UnknownCommand(command.to_string()));
            }
            Command::Context(text) => self.request.context = self.substitute(text).await?,
            Command::Content(text) => {
                self.request.content = self.substitute(text).await?;
                self.send().await?;
            }
        }
        Ok(Flow::Continue)
    }

    /// Expands `template`, writing one `KEY NOT FOUND` diagnostic per
    /// unresolved occurrence.
    ///
    /// # Errors
    /// Output channel failures.
    pub async fn substitute(&mut self, template: &str) -> Result<String, RelayError> {
        let store = &self.store;
        let expansion = template::expand(template, |name| store.lookup(name), &mut rand::rng());
        for name in expansion.missing {
            let error = RelayError::KeyNotFound(name);
            debug!("Substitution: {error}");
            self.sink.println(&error.diagnostic()).await?;
        }
        Ok(expansion.text)
    }

    async fn configure(&mut self, command: ConfigCommand<'_>) -> Result<(), RelayError> {
        match command {
            ConfigCommand::List => {
                let mut lines = vec![">CONFIG".to_string()];
                lines.extend(
                    self.store
                        .enumerate()
                        .map(|(key, value)| format!("{key}: {value}")),
                );
                self.print_lines(&lines).await
            }
            ConfigCommand::Delete(key) => self.store.set(key, "").await,
            ConfigCommand::Set { key, value } => self.store.set(key, value).await,
        }
    }

    async fn add_header(&mut self, raw: &str) -> Result<(), RelayError> {
        let (key, value) = split_header(raw)?;
        let value = self.substitute(value).await?;
        self.request.headers.push(Header::new(key, value.trim()))
    }

    async fn report_connectivity(&mut self) -> Result<(), RelayError> {
        let line = match self.connector.local_address().await {
            Ok(address) => format!(">NET CONNECTED, IP: {address}"),
            Err(e) => {
                debug!("Connectivity probe failed: {e}");
                ">NET NOT CONNECTED".to_string()
            }
        };
        self.sink.println(&line).await?;
        Ok(())
    }

    async fn send(&mut self) -> Result<(), RelayError> {
        if !self.request.is_ready() {
            return Err(RelayError::MissingMethodOrUrl);
        }
        let target = Target::parse(&self.request.url)?;
        let kind = self.request.filter.resolve()?;

        let body = if self.request.method.sends_body() {
            let template = self.request.body.clone();
            let body = self.substitute(&template).await?;
            self.request.render_body(&body)
        } else {
            String::new()
        };
        let wire = build_request(&self.request, &target, &body);

        info!(
            "Sending {} {} with filter {}",
            self.request.method,
            self.request.url,
            kind.name()
        );
        let connection = self.connector.connect(&target).await.map_err(|e| {
            warn!("Connection to {}:{} failed: {e}", target.host, target.port);
            RelayError::Connect(e)
        })?;

        let options = self.settings.exchange_options(self.markers);
        exchange(connection, &wire, kind, &mut self.sink, options).await
    }

    async fn print_lines(&mut self, lines: &[String]) -> Result<(), RelayError> {
        for line in lines {
            self.sink.println(line).await?;
        }
        Ok(())
    }
}
