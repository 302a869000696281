//! Connect attempt data handed in by the broker.

/// TLS-level information about a connecting client.
#[derive(Debug, Clone, Default)]
pub struct TlsInfo {
    /// DER-encoded client certificate from the mutual-TLS handshake.
    pub client_certificate_der: Option<Vec<u8>>,
}

/// Everything the validators may inspect about one connect attempt.
#[derive(Debug, Clone)]
pub struct ConnectRequest {
    /// The MQTT client identifier.
    pub client_id: String,
    /// The MQTT username.
    pub user_name: String,
    /// The MQTT password field, if present. May carry a static secret, a
    /// signed token, or a base64 PEM certificate.
    pub password: Option<String>,
    /// TLS info; `None` for plaintext listeners.
    pub tls: Option<TlsInfo>,
    /// Set by the host for connections arriving on the internal service
    /// listener (trusted network, no TLS).
    pub internal_listener: bool,
}

impl ConnectRequest {
    /// A plaintext request with username/password only.
    pub fn basic(
        client_id: impl Into<String>,
        user_name: impl Into<String>,
        password: Option<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            user_name: user_name.into(),
            password,
            tls: None,
            internal_listener: false,
        }
    }

    /// The client certificate DER, if the handshake produced one.
    pub fn client_certificate_der(&self) -> Option<&[u8]> {
        self.tls
            .as_ref()
            .and_then(|t| t.client_certificate_der.as_deref())
    }
}
