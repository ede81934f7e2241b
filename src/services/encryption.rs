use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use anyhow::{Context, Result};
use hkdf::Hkdf;
use rand::RngCore;
use sha2::{Digest, Sha256};

const NONCE_LEN: usize = 12;

/// Turns `ENCRYPTION_KEY` into a 32-byte master key: 64 hex characters are
/// decoded as-is, anything else is hashed with SHA-256.
pub fn master_key_from_env_value(value: &str) -> [u8; 32] {
    if value.len() == 64 {
        if let Ok(bytes) = hex::decode(value) {
            let mut key = [0u8; 32];
            key.copy_from_slice(&bytes);
            return key;
        }
    }
    let mut key = [0u8; 32];
    key.copy_from_slice(&Sha256::digest(value.as_bytes()));
    key
}

/// Derives the key used for one tenant database's secrets.
pub fn derive_tenant_key(master_key: &[u8; 32], database: &str) -> Result<[u8; 32]> {
    let hk = Hkdf::<Sha256>::new(None, master_key);
    let info = format!("nexsys-tenant-{database}");
    let mut tenant_key = [0u8; 32];
    hk.expand(info.as_bytes(), &mut tenant_key)
        .map_err(|_| anyhow::anyhow!("Failed to derive tenant key"))?;
    Ok(tenant_key)
}

/// Encrypts a short secret with AES-256-GCM under a fresh random nonce.
/// Output is `hex(nonce):hex(ciphertext||tag)`.
pub fn encrypt_secret(plaintext: &str, key: &[u8; 32]) -> Result<String> {
    let cipher = Aes256Gcm::new_from_slice(key).context("Failed to create cipher")?;

    let mut iv = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut iv);

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&iv), plaintext.as_bytes())
        .map_err(|e| anyhow::anyhow!("Encryption failed: {}", e))?;

    Ok(format!("{}:{}", hex::encode(iv), hex::encode(ciphertext)))
}

pub fn decrypt_secret(stored: &str, key: &[u8; 32]) -> Result<String> {
    let (iv_hex, data_hex) = stored
        .split_once(':')
        .context("Stored secret is missing its nonce")?;
    let iv = hex::decode(iv_hex).context("Stored nonce is not hex")?;
    if iv.len() != NONCE_LEN {
        anyhow::bail!("Nonce must be exactly {NONCE_LEN} bytes");
    }
    let data = hex::decode(data_hex).context("Stored ciphertext is not hex")?;

    let cipher = Aes256Gcm::new_from_slice(key).context("Failed to create cipher")?;
    let plaintext = cipher
        .decrypt(Nonce::from_slice(&iv), data.as_ref())
        .map_err(|e| anyhow::anyhow!("Decryption failed (data may be corrupted or tampered): {}", e))?;

    String::from_utf8(plaintext).context("Decrypted secret is not UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_keys_are_used_verbatim() {
        let hex_key = "11".repeat(32);
        assert_eq!(master_key_from_env_value(&hex_key), [0x11u8; 32]);
    }

    #[test]
    fn passphrases_are_hashed() {
        let a = master_key_from_env_value("default_secret_key");
        let b = master_key_from_env_value("default_secret_key");
        assert_eq!(a, b);
        assert_ne!(a, master_key_from_env_value("another"));
    }

    #[test]
    fn tenant_keys_differ_per_database() {
        let master = [7u8; 32];
        let a = derive_tenant_key(&master, "company_acme").unwrap();
        let b = derive_tenant_key(&master, "company_mbs_tech").unwrap();
        assert_eq!(a, derive_tenant_key(&master, "company_acme").unwrap());
        assert_ne!(a, b);
    }

    #[test]
    fn same_secret_encrypts_differently_each_time() {
        let key = [42u8; 32];
        let first = encrypt_secret("hunter2", &key).unwrap();
        let second = encrypt_secret("hunter2", &key).unwrap();
        assert_ne!(first, second);
        assert_eq!(decrypt_secret(&first, &key).unwrap(), "hunter2");
        assert_eq!(decrypt_secret(&second, &key).unwrap(), "hunter2");
    }

    #[test]
    fn wrong_key_fails() {
        let stored = encrypt_secret("smtp-password", &[1u8; 32]).unwrap();
        assert!(decrypt_secret(&stored, &[2u8; 32]).is_err());
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let key = [42u8; 32];
        let stored = encrypt_secret("smtp-password", &key).unwrap();
        let (iv, data) = stored.split_once(':').unwrap();
        let mut bytes = hex::decode(data).unwrap();
        bytes[0] ^= 1;
        let tampered = format!("{iv}:{}", hex::encode(bytes));
        assert!(decrypt_secret(&tampered, &key).is_err());
    }

    #[test]
    fn legacy_static_iv_values_are_rejected() {
        // Hex without a nonce prefix, as written by the old CBC scheme.
        assert!(decrypt_secret("9f86d081884c7d659a2feaa0c55ad015", &[0u8; 32]).is_err());
    }
}
