//! Ephemeral self-signed code-signing certificates
//!
//! A fresh RSA key and a self-signed certificate restricted to code signing
//! are generated per run and exported as a password-protected PKCS#12 file.
//! The file lives only as long as its [`CertificateFile`] handle.

use crate::error::{GenerateError, Result};
use chrono::{DateTime, Months, TimeDelta, Utc};
use rand::distr::{Alphanumeric, SampleString};
use rcgen::{
    CertificateParams, DistinguishedName, DnType, ExtendedKeyUsagePurpose, IsCa, KeyPair,
    KeyUsagePurpose, SerialNumber,
};
use rsa::RsaPrivateKey;
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use zeroize::Zeroizing;

/// Modulus size of the signing key
pub const RSA_KEY_BITS: usize = 2048;

/// Self-signed certificate plus private key, held in memory
pub struct EphemeralCertificate {
    common_name: String,
    certificate_der: Vec<u8>,
    private_key_der: Zeroizing<Vec<u8>>,
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
}

impl std::fmt::Debug for EphemeralCertificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EphemeralCertificate")
            .field("common_name", &self.common_name)
            .field("not_before", &self.not_before)
            .field("not_after", &self.not_after)
            .finish_non_exhaustive()
    }
}

impl EphemeralCertificate {
    /// Generate a certificate for `CN=<common_name>` issued now
    pub fn generate(common_name: &str) -> Result<Self> {
        Self::generate_at(common_name, Utc::now())
    }

    /// Generate a certificate issued at `issued_at`.
    ///
    /// Validity runs from one day before issuance to one year after it. The
    /// certificate is marked non-CA, key usage is digital signature + key
    /// encipherment, extended key usage is code signing only.
    pub fn generate_at(common_name: &str, issued_at: DateTime<Utc>) -> Result<Self> {
        let private_key = RsaPrivateKey::new(&mut rsa::rand_core::OsRng, RSA_KEY_BITS)
            .map_err(|e| GenerateError::Crypto(format!("RSA key generation failed: {e}")))?;
        let key_pem = private_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| GenerateError::Crypto(format!("Private key encoding failed: {e}")))?;
        let key_pair = KeyPair::from_pem_and_sign_algo(key_pem.as_str(), &rcgen::PKCS_RSA_SHA256)?;

        let not_before = issued_at - TimeDelta::days(1);
        let not_after = issued_at
            .checked_add_months(Months::new(12))
            .ok_or_else(|| GenerateError::Crypto("Certificate expiry out of range".to_string()))?;

        let mut params = CertificateParams::new(Vec::<String>::new())?;
        let mut dn = DistinguishedName::new();
        dn.push(DnType::CommonName, common_name);
        params.distinguished_name = dn;
        params.not_before = to_asn1_time(not_before)?;
        params.not_after = to_asn1_time(not_after)?;
        params.serial_number = Some(random_serial());
        params.is_ca = IsCa::ExplicitNoCa;
        params.key_usages = vec![
            KeyUsagePurpose::DigitalSignature,
            KeyUsagePurpose::KeyEncipherment,
        ];
        params.extended_key_usages = vec![ExtendedKeyUsagePurpose::CodeSigning];

        let certificate = params.self_signed(&key_pair)?;

        Ok(Self {
            common_name: common_name.to_string(),
            certificate_der: certificate.der().to_vec(),
            private_key_der: Zeroizing::new(key_pair.serialize_der()),
            not_before,
            not_after,
        })
    }

    #[must_use]
    pub fn common_name(&self) -> &str {
        &self.common_name
    }

    #[must_use]
    pub fn certificate_der(&self) -> &[u8] {
        &self.certificate_der
    }

    #[must_use]
    pub fn not_before(&self) -> DateTime<Utc> {
        self.not_before
    }

    #[must_use]
    pub fn not_after(&self) -> DateTime<Utc> {
        self.not_after
    }

    /// Export certificate and private key as a PKCS#12 archive protected by `password`
    pub fn to_pkcs12(&self, password: &str) -> Result<Vec<u8>> {
        let pfx = p12::PFX::new(
            &self.certificate_der,
            &self.private_key_der,
            None,
            password,
            &self.common_name,
        )
        .ok_or_else(|| GenerateError::Crypto("PKCS#12 export failed".to_string()))?;
        Ok(pfx.to_der())
    }
}

fn to_asn1_time(at: DateTime<Utc>) -> Result<time::OffsetDateTime> {
    time::OffsetDateTime::from_unix_timestamp(at.timestamp())
        .map_err(|e| GenerateError::Crypto(format!("Invalid certificate validity date: {e}")))
}

fn random_serial() -> SerialNumber {
    let mut bytes: [u8; 16] = rand::random();
    // positive INTEGER
    bytes[0] &= 0x7f;
    SerialNumber::from_slice(&bytes)
}

/// Exported PKCS#12 file, deleted by [`CertificateFile::cleanup`] or on drop
#[derive(Debug)]
pub struct CertificateFile {
    path: PathBuf,
    released: bool,
}

impl CertificateFile {
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the certificate file (best-effort, never fails)
    pub async fn cleanup(mut self) {
        crate::cleanup_path(&self.path, "ephemeral certificate").await;
        self.released = true;
    }
}

impl Drop for CertificateFile {
    fn drop(&mut self) {
        if !self.released {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

/// Issue a code-signing certificate for `CN=<common_name>` and export it to a
/// uniquely named `.pfx` file in `dir`.
///
/// Key generation runs on the blocking pool.
///
/// # Returns
/// * `Ok(CertificateFile)` - Handle owning the exported file
/// * `Err(GenerateError::Crypto)` - Key generation, signing or export failed
/// * `Err(GenerateError::Io)` - The file could not be written
pub async fn issue_code_signing_certificate(
    common_name: &str,
    password: &str,
    dir: &Path,
) -> Result<CertificateFile> {
    let name = common_name.to_string();
    let certificate = tokio::task::spawn_blocking(move || EphemeralCertificate::generate(&name))
        .await
        .map_err(|e| GenerateError::Crypto(format!("Certificate generation task failed: {e}")))??;

    let pfx = certificate.to_pkcs12(password)?;

    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(format!(
        "{}.pfx",
        Alphanumeric.sample_string(&mut rand::rng(), 32)
    ));

    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(&path).await?;
    // From here on the handle owns the path, so a failed write is removed too.
    let handle = CertificateFile {
        path,
        released: false,
    };
    file.write_all(&pfx).await?;
    file.sync_all().await?;

    tracing::debug!(
        subject = %format!("CN={common_name}"),
        path = %handle.path.display(),
        not_after = %certificate.not_after(),
        "issued ephemeral code-signing certificate"
    );

    Ok(handle)
}
