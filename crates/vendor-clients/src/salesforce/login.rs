use crate::error::{CredentialError, sanitize_reqwest_error};

/// A logged-in Salesforce session.
#[derive(Debug, Clone)]
pub struct SalesforceSession {
    pub session_id: String,
    /// `scheme://host[:port]` of the org's instance.
    pub instance_url: String,
}

/// Username/password/security-token login material.
#[derive(Clone)]
pub struct SalesforceLogin {
    http: reqwest::Client,
    login_base: String,
    api_version: String,
    client_name: String,
    username: String,
    password: String,
    security_token: String,
}

impl SalesforceLogin {
    #[must_use]
    pub fn new(
        http: reqwest::Client,
        username: impl Into<String>,
        password: impl Into<String>,
        security_token: impl Into<String>,
    ) -> Self {
        Self {
            http,
            login_base: login_base_for_domain(super::DEFAULT_DOMAIN),
            api_version: super::DEFAULT_API_VERSION.to_string(),
            client_name: "revops-mcp-gateway".to_string(),
            username: username.into(),
            password: password.into(),
            security_token: security_token.into(),
        }
    }

    /// Log in against `https://<domain>.salesforce.com` (`login`, `test`, or a My Domain prefix).
    #[must_use]
    pub fn with_domain(mut self, domain: &str) -> Self {
        self.login_base = login_base_for_domain(domain);
        self
    }

    /// Log in against an explicit base URL (e.g. a mock server).
    #[must_use]
    pub fn with_login_base(mut self, base: impl Into<String>) -> Self {
        self.login_base = base.into();
        self
    }

    #[must_use]
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Client name reported in the SOAP `CallOptions` header.
    #[must_use]
    pub fn with_client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = name.into();
        self
    }

    #[must_use]
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    #[must_use]
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Perform a SOAP partner `login` call.
    ///
    /// # Errors
    ///
    /// Returns `NotConfigured` when no username is set, and `Login` when Salesforce returns a
    /// fault or an unparseable envelope.
    pub async fn login(&self) -> Result<SalesforceSession, CredentialError> {
        if self.username.trim().is_empty() {
            return Err(CredentialError::NotConfigured("salesforce"));
        }

        let url = format!(
            "{}/services/Soap/u/{}",
            self.login_base.trim_end_matches('/'),
            self.api_version
        );
        let envelope = login_envelope(
            &self.client_name,
            &self.username,
            &self.password,
            &self.security_token,
        );

        let resp = self
            .http
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "text/xml; charset=UTF-8")
            .header("SOAPAction", "login")
            .body(envelope)
            .send()
            .await
            .map_err(|e| CredentialError::Login(sanitize_reqwest_error(e)))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| CredentialError::Login(sanitize_reqwest_error(e)))?;

        if !status.is_success() {
            let reason = element_text(&body, "exceptionMessage")
                .or_else(|| element_text(&body, "faultstring"))
                .unwrap_or_else(|| "unknown fault".to_string());
            return Err(CredentialError::Login(format!(
                "{} {reason}",
                status.as_u16()
            )));
        }

        parse_login_response(&body)
    }
}

fn login_base_for_domain(domain: &str) -> String {
    format!("https://{}.salesforce.com", domain.trim())
}

fn login_envelope(client: &str, username: &str, password: &str, token: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8" ?>
<env:Envelope
        xmlns:xsd="http://www.w3.org/2001/XMLSchema"
        xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
        xmlns:env="http://schemas.xmlsoap.org/soap/envelope/"
        xmlns:urn="urn:partner.soap.sforce.com">
    <env:Header>
        <urn:CallOptions>
            <urn:client>{client}</urn:client>
            <urn:defaultNamespace>sf</urn:defaultNamespace>
        </urn:CallOptions>
    </env:Header>
    <env:Body>
        <n1:login xmlns:n1="urn:partner.soap.sforce.com">
            <n1:username>{username}</n1:username>
            <n1:password>{password}{token}</n1:password>
        </n1:login>
    </env:Body>
</env:Envelope>"#,
        client = xml_escape(client),
        username = xml_escape(username),
        password = xml_escape(password),
        token = xml_escape(token),
    )
}

fn parse_login_response(body: &str) -> Result<SalesforceSession, CredentialError> {
    let session_id = element_text(body, "sessionId")
        .ok_or_else(|| CredentialError::Login("login response missing sessionId".into()))?;
    let server_url = element_text(body, "serverUrl")
        .ok_or_else(|| CredentialError::Login("login response missing serverUrl".into()))?;
    let parsed = url::Url::parse(&server_url)
        .map_err(|e| CredentialError::Login(format!("invalid serverUrl: {e}")))?;

    Ok(SalesforceSession {
        session_id,
        instance_url: parsed.origin().ascii_serialization(),
    })
}

fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

// Predefined entities and numeric character references only.
fn xml_unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail.find(';').and_then(|semi| {
            let c = match &tail[1..semi] {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                ent => ent
                    .strip_prefix("#x")
                    .or_else(|| ent.strip_prefix("#X"))
                    .map(|hex| u32::from_str_radix(hex, 16))
                    .or_else(|| ent.strip_prefix('#').map(str::parse::<u32>))
                    .and_then(Result::ok)
                    .and_then(char::from_u32),
            }?;
            Some((c, semi + 1))
        });
        match decoded {
            Some((c, len)) => {
                out.push(c);
                rest = &tail[len..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Text of the first `<tag>` / `<ns:tag>` element (no nesting), entities decoded.
fn element_text(xml: &str, tag: &str) -> Option<String> {
    let mut rest = xml;
    while let Some(lt) = rest.find('<') {
        rest = &rest[lt + 1..];
        let end = rest.find('>')?;
        let open = &rest[..end];
        let name = open.split_whitespace().next().unwrap_or("");
        let local = name.rsplit(':').next().unwrap_or(name);
        if local == tag && !open.starts_with('/') && !open.ends_with('/') {
            let content = &rest[end + 1..];
            let close = content.find("</")?;
            return Some(xml_unescape(content[..close].trim()));
        }
        rest = &rest[end + 1..];
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOGIN_OK: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" xmlns="urn:partner.soap.sforce.com">
<soapenv:Body><loginResponse><result>
<metadataServerUrl>https://acme.my.salesforce.com/services/Soap/m/59.0/00D</metadataServerUrl>
<passwordExpired>false</passwordExpired>
<serverUrl>https://acme.my.salesforce.com/services/Soap/u/59.0/00D000000000001</serverUrl>
<sessionId>00D000000000001!AQ0AQ.session</sessionId>
</result></loginResponse></soapenv:Body></soapenv:Envelope>"#;

    #[test]
    fn parses_session_and_instance_origin() {
        let session = parse_login_response(LOGIN_OK).expect("parse");
        assert_eq!(session.session_id, "00D000000000001!AQ0AQ.session");
        assert_eq!(session.instance_url, "https://acme.my.salesforce.com");
    }

    #[test]
    fn element_text_matches_namespaced_tags() {
        let fault = r"<soapenv:Fault><faultcode>sf:INVALID_LOGIN</faultcode><faultstring>INVALID_LOGIN: Invalid username</faultstring></soapenv:Fault>";
        assert_eq!(
            element_text(fault, "faultstring").as_deref(),
            Some("INVALID_LOGIN: Invalid username")
        );
        assert_eq!(element_text("<a:x>1</a:x>", "x").as_deref(), Some("1"));
        assert_eq!(element_text("<x/>", "x"), None);
    }

    #[test]
    fn element_text_decodes_entities() {
        let fault = "<faultstring>INVALID_LOGIN: user&apos;s &quot;token&quot; &lt;expired&gt; &amp; locked &#38; &#x41;</faultstring>";
        assert_eq!(
            element_text(fault, "faultstring").as_deref(),
            Some(r#"INVALID_LOGIN: user's "token" <expired> & locked & A"#)
        );
        assert_eq!(xml_unescape("a & b &bogus; c"), "a & b &bogus; c");
        assert_eq!(xml_unescape(&xml_escape(r#"p<&>"'"#)), r#"p<&>"'"#);
    }

    #[test]
    fn envelope_escapes_credentials() {
        let env = login_envelope("c", "u@example.com", "p<&>", "tok");
        assert!(env.contains("<n1:password>p&lt;&amp;&gt;tok</n1:password>"));
        assert!(env.contains("<urn:client>c</urn:client>"));
    }
}
