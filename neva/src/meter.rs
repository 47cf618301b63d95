//! High-level meter interface

use std::sync::Arc;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use neva_core::constants::LF;
use neva_core::{parser, Command, Response, RetryPolicy, Session, SessionState, Value};
use neva_transport::Transport;
use neva_types::{Address, AddressRegistry, AddressTable, Binding, MeterInfo};

use crate::config::MeterConfig;
use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::outcome::{Advisory, Outcome};

/// What to read: an alias from the model's address table, or a raw address
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Alias(String),
    Address(Address),
}

impl From<&str> for Target {
    fn from(alias: &str) -> Self {
        Self::Alias(alias.to_string())
    }
}

impl From<String> for Target {
    fn from(alias: String) -> Self {
        Self::Alias(alias)
    }
}

impl From<Address> for Target {
    fn from(address: Address) -> Self {
        Self::Address(address)
    }
}

impl From<&Address> for Target {
    fn from(address: &Address) -> Self {
        Self::Address(address.clone())
    }
}

/// NEVA meter session
///
/// Owns the connection and drives the handshake:
/// identify, negotiate speed, authenticate. Registers can be read once the
/// session is [`SessionState::Ready`].
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use neva::{Address, AddressRegistry, AddressTable, Meter, MeterConfig};
///
/// #[tokio::main]
/// async fn main() -> neva::Result<()> {
///     let mut registry = AddressRegistry::new();
///     let table = AddressTable::new().with_register("voltage", Address::new("VOLT")?);
///     registry.register("MT174", table);
///
///     let config = MeterConfig::new("socket://10.0.0.5:5000");
///     let mut meter = Meter::new(config, Arc::new(registry))?;
///
///     let identity = meter.connect().await?;
///     println!("Connected to {}", identity.value);
///
///     let voltage = meter.read("voltage").await?;
///     println!("Voltage: {:?}", voltage.value);
///
///     meter.close().await?;
///     Ok(())
/// }
/// ```
pub struct Meter {
    connection: Connection,
    session: Session,
    config: MeterConfig,
    registry: Arc<AddressRegistry>,
    info: Option<MeterInfo>,
    addresses: Option<Arc<AddressTable>>,
    retry: RetryPolicy,
}

impl Meter {
    /// Create a meter for `config.url`; the link is opened by [`Meter::connect`]
    pub fn new(config: MeterConfig, registry: Arc<AddressRegistry>) -> Result<Self> {
        config.validate()?;
        let transport = neva_transport::open_url(&config.url, config.link.clone())?;
        Ok(Self::build(transport, config, registry))
    }

    /// Create a meter over an existing transport
    pub fn with_transport(
        transport: Box<dyn Transport>,
        config: MeterConfig,
        registry: Arc<AddressRegistry>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(transport, config, registry))
    }

    fn build(
        transport: Box<dyn Transport>,
        config: MeterConfig,
        registry: Arc<AddressRegistry>,
    ) -> Self {
        Self {
            connection: Connection::new(transport),
            session: Session::new(),
            config,
            registry,
            info: None,
            addresses: None,
            retry: RetryPolicy::default(),
        }
    }

    /// Get current state
    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Check if registers can be read
    pub fn is_ready(&self) -> bool {
        self.session.is_ready()
    }

    /// Identity reported by the meter, once identified
    pub fn info(&self) -> Option<&MeterInfo> {
        self.info.as_ref()
    }

    /// Address table loaded for the identified model
    pub fn addresses(&self) -> Option<&AddressTable> {
        self.addresses.as_deref()
    }

    /// Exchange counter of the underlying connection
    pub fn sequence(&self) -> u64 {
        self.connection.sequence()
    }

    pub fn config(&self) -> &MeterConfig {
        &self.config
    }

    /// Run the handshake
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - the link cannot be opened or fails mid-exchange
    /// - the identification reply cannot be parsed
    /// - the password is not acknowledged after all retries
    /// - the session was already connected or closed
    ///
    /// An unknown model or a bad check byte on the speed frame only adds an
    /// advisory to the returned outcome.
    pub async fn connect(&mut self) -> Result<Outcome<MeterInfo>> {
        self.ensure_not_closed()?;
        self.session.advance(SessionState::Identifying)?;

        info!("Connecting to {}...", self.connection.remote_addr());
        self.connection.open().await?;

        let mut advisories = Vec::new();

        let info = self.identify().await?;
        info!("Identified {} (speed {})", info, info.speed);

        match self.registry.lookup(&info.model) {
            Some(table) => {
                debug!(model = %info.model, aliases = table.len(), "Loaded address table");
                self.addresses = Some(table);
            }
            None => advisories.push(advise(Advisory::UnknownModel(info.model.clone()))),
        }
        self.info = Some(info.clone());

        self.session.advance(SessionState::NegotiatingSpeed)?;
        let baud_rate = self.connection.negotiate_baud(info.speed).await?;

        let frame = self.connection.read().await?;
        if !frame.is_valid() {
            advisories.push(checksum_advisory(&frame));
        }
        debug!(baud_rate, "Meter answered at new speed");

        self.session.advance(SessionState::Authenticating)?;
        self.authenticate().await?;

        self.session.advance(SessionState::Ready)?;
        info!("Connected successfully ({} at {} baud)", info, baud_rate);

        Ok(Outcome::with_advisories(info, advisories))
    }

    async fn identify(&mut self) -> Result<MeterInfo> {
        self.connection.write_command(&Command::Identify).await?;
        let reply = self.connection.read_until(LF, false).await?;
        let text = reply.text();

        MeterInfo::parse(&text).map_err(|e| Error::MalformedIdentification {
            reply: text.clone(),
            reason: e.to_string(),
        })
    }

    async fn authenticate(&mut self) -> Result<()> {
        let command = Command::Password(self.config.password.clone());

        for attempt in 0..self.retry.attempts() {
            self.connection.write_command(&command).await?;

            if self.connection.read_ack().await? {
                debug!(attempt, "Password accepted");
                return Ok(());
            }

            match self.retry.delay(attempt) {
                Some(delay) => {
                    warn!(
                        "Password not acknowledged (attempt {}), retrying in {:?}",
                        attempt + 1,
                        delay
                    );
                    sleep(delay).await;
                }
                None => break,
            }
        }

        Err(Error::AuthenticationExhausted {
            attempts: self.retry.attempts(),
        })
    }

    /// Look up an alias in the loaded address table
    pub fn resolve(&self, alias: &str) -> Result<Binding> {
        self.addresses
            .as_ref()
            .and_then(|table| table.get(alias))
            .cloned()
            .ok_or_else(|| Error::AddressNotFound(alias.to_string()))
    }

    fn binding(&self, target: &Target) -> Result<Binding> {
        match target {
            Target::Alias(alias) => self.resolve(alias),
            Target::Address(address) => Ok(Binding::Register(address.clone())),
        }
    }

    /// Read a register by alias or address
    ///
    /// Returns `None` with an [`Advisory::UnsupportedRegister`] when the meter
    /// does not echo the address. A range alias reads every register of the
    /// range and returns a [`Value::List`] of the supported ones.
    pub async fn read(&mut self, target: impl Into<Target>) -> Result<Outcome<Option<Value>>> {
        self.read_with_args(target, &[]).await
    }

    /// Read a register, passing arguments inside the parentheses
    pub async fn read_with_args(
        &mut self,
        target: impl Into<Target>,
        args: &[&str],
    ) -> Result<Outcome<Option<Value>>> {
        self.ensure_ready()?;

        let target = target.into();
        let raw = self.is_raw(&target);

        match self.binding(&target)? {
            Binding::Register(address) => self.read_register(&address, args, raw).await,
            Binding::Range { first, last } => {
                let outcome = self.read_each(Address::range(&first, &last)?, raw).await?;
                Ok(outcome.map(|values| {
                    Some(Value::List(values.into_iter().flatten().collect()))
                }))
            }
        }
    }

    /// Read `length` registers of a range alias, skipping the first `offset`
    pub async fn read_range(
        &mut self,
        alias: &str,
        length: usize,
        offset: usize,
    ) -> Result<Outcome<Vec<Option<Value>>>> {
        self.ensure_ready()?;

        match self.resolve(alias)? {
            Binding::Range { first, last } => {
                let raw = self.config.is_raw(alias);
                self.read_span(&first, &last, length, offset, raw).await
            }
            Binding::Register(_) => Err(Error::NotARange(alias.to_string())),
        }
    }

    /// Read `length` registers between two raw addresses, skipping the first `offset`
    pub async fn read_address_range(
        &mut self,
        first: &Address,
        last: &Address,
        length: usize,
        offset: usize,
    ) -> Result<Outcome<Vec<Option<Value>>>> {
        self.ensure_ready()?;
        self.read_span(first, last, length, offset, false).await
    }

    async fn read_span(
        &mut self,
        first: &Address,
        last: &Address,
        length: usize,
        offset: usize,
        raw: bool,
    ) -> Result<Outcome<Vec<Option<Value>>>> {
        let addresses = Address::range(first, last)?.skip(offset).take(length);
        self.read_each(addresses, raw).await
    }

    async fn read_each(
        &mut self,
        addresses: impl Iterator<Item = Address> + Send,
        raw: bool,
    ) -> Result<Outcome<Vec<Option<Value>>>> {
        let mut values = Vec::new();
        let mut advisories = Vec::new();

        for address in addresses {
            let outcome = self.read_register(&address, &[], raw).await?;
            values.push(outcome.value);
            advisories.extend(outcome.advisories);
        }

        Ok(Outcome::with_advisories(values, advisories))
    }

    async fn read_register(
        &mut self,
        address: &Address,
        args: &[&str],
        raw: bool,
    ) -> Result<Outcome<Option<Value>>> {
        let command = Command::ReadRegister {
            address: address.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        };

        self.connection.write_command(&command).await?;
        let response = self.connection.read().await?;

        let mut advisories = Vec::new();
        if !response.is_valid() {
            advisories.push(checksum_advisory(&response));
        }

        let Some(text) = parser::extract(&response.text(), address.as_str()) else {
            advisories.push(advise(Advisory::UnsupportedRegister(address.to_string())));
            return Ok(Outcome::with_advisories(None, advisories));
        };

        let value = parser::parse_value(&text, raw);
        debug!(address = %address, value = %value, "Read register");

        Ok(Outcome::with_advisories(Some(value), advisories))
    }

    fn is_raw(&self, target: &Target) -> bool {
        match target {
            Target::Alias(alias) => self.config.is_raw(alias),
            Target::Address(_) => false,
        }
    }

    /// Close the session
    ///
    /// Sends the disconnect packet if the link is open. The session is
    /// closed afterwards even if tearing down the link failed. Closing twice
    /// is a no-op.
    pub async fn close(&mut self) -> Result<()> {
        if self.session.is_closed() {
            return Ok(());
        }

        info!("Disconnecting from {}...", self.connection.remote_addr());

        let result = self.connection.close().await;
        self.session.close();
        result?;

        info!("Disconnected");
        Ok(())
    }

    // Helper methods

    fn ensure_not_closed(&self) -> Result<()> {
        if self.session.is_closed() {
            return Err(Error::SessionClosed);
        }
        Ok(())
    }

    fn ensure_ready(&self) -> Result<()> {
        self.ensure_not_closed()?;
        if !self.session.is_ready() {
            return Err(Error::NotReady(self.session.state()));
        }
        Ok(())
    }
}

impl Drop for Meter {
    fn drop(&mut self) {
        if !self.session.is_closed() && self.connection.is_open() {
            warn!("Meter dropped without close; disconnect packet not sent");
        }
    }
}

fn advise(advisory: Advisory) -> Advisory {
    warn!("{}", advisory);
    advisory
}

fn checksum_advisory(response: &Response) -> Advisory {
    Advisory::ChecksumMismatch {
        expected: response.expected_checksum(),
        received: response.checksum,
    }
}
