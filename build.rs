use std::env;

/// Forwards the deployment's master encryption key into a compile-time
/// constant (`env!("TELEHOOK_MASTER_KEY_B64")` in `application::config`).
///
/// The master key decrypts `SECRET_SALT` and `PAYLOAD_ENCRYPTION_KEY` at
/// startup; it is never itself read from the process environment at
/// runtime, matching the upstream service's build-time secret injection.
fn main() {
    println!("cargo:rerun-if-env-changed=TELEHOOK_MASTER_KEY_B64");

    let key = env::var("TELEHOOK_MASTER_KEY_B64").unwrap_or_else(|_| {
        println!(
            "cargo:warning=TELEHOOK_MASTER_KEY_B64 not set at build time; \
             using an all-zero development key. Do not ship this binary."
        );
        base64_of_zero_key()
    });

    println!("cargo:rustc-env=TELEHOOK_MASTER_KEY_B64={key}");
}

fn base64_of_zero_key() -> String {
    const TABLE: &[u8; 64] =
        b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
    let zeros = [0u8; 32];
    let mut out = String::new();
    for chunk in zeros.chunks(3) {
        let b0 = chunk[0];
        let b1 = chunk.get(1).copied();
        let b2 = chunk.get(2).copied();
        out.push(TABLE[(b0 >> 2) as usize] as char);
        out.push(TABLE[(((b0 & 0x03) << 4) | (b1.unwrap_or(0) >> 4)) as usize] as char);
        out.push(match b1 {
            Some(b1) => TABLE[(((b1 & 0x0f) << 2) | (b2.unwrap_or(0) >> 6)) as usize] as char,
            None => '=',
        });
        out.push(match b2 {
            Some(b2) => TABLE[(b2 & 0x3f) as usize] as char,
            None => '=',
        });
    }
    out
}
