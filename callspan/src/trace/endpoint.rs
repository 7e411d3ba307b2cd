use std::net::{IpAddr, SocketAddr};

/// The resolved identity of the remote side of a call.
///
/// Attached to a span so backends can aggregate by destination. Every
/// field is optional; which ones are present depends on what the request
/// adapter could read and whether a static server name was configured.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Endpoint {
    service_name: Option<String>,
    address: Option<IpAddr>,
    port: Option<u16>,
}

impl Endpoint {
    /// Starts building a new `Endpoint`.
    pub fn builder() -> EndpointBuilder {
        EndpointBuilder::default()
    }

    /// The logical name of the remote service, if known.
    pub fn service_name(&self) -> Option<&str> {
        self.service_name.as_deref()
    }

    /// The remote IP address, if known.
    pub fn address(&self) -> Option<IpAddr> {
        self.address
    }

    /// The remote port, if known.
    pub fn port(&self) -> Option<u16> {
        self.port
    }
}

/// Builder for [`Endpoint`], populated field-by-field by request
/// adapters.
#[derive(Clone, Debug, Default)]
pub struct EndpointBuilder {
    service_name: Option<String>,
    address: Option<IpAddr>,
    port: Option<u16>,
}

impl EndpointBuilder {
    /// Sets the logical name of the remote service.
    pub fn service_name(&mut self, service_name: impl Into<String>) -> &mut Self {
        self.service_name = Some(service_name.into());
        self
    }

    /// Sets the remote IP address.
    pub fn address(&mut self, address: IpAddr) -> &mut Self {
        self.address = Some(address);
        self
    }

    /// Sets the remote port.
    pub fn port(&mut self, port: u16) -> &mut Self {
        self.port = Some(port);
        self
    }

    /// Sets the remote address and port from a socket address.
    pub fn socket_addr(&mut self, addr: SocketAddr) -> &mut Self {
        self.address(addr.ip()).port(addr.port())
    }

    /// Returns `true` if a service name has been supplied.
    pub fn has_service_name(&self) -> bool {
        self.service_name.is_some()
    }

    /// Builds the endpoint.
    pub fn build(self) -> Endpoint {
        Endpoint {
            service_name: self.service_name,
            address: self.address,
            port: self.port,
        }
    }
}
