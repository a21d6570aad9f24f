use anyhow::Result;
use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounter, TextEncoder, opts, register_int_counter};

pub static UNAUTHORIZED_REDIRECTS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(opts!(
        "depot_unauthorized_redirects_total",
        "Requests redirected to the login page for lack of a session user"
    ))
    .unwrap()
});

pub static UNSUPPORTED_LOCALE_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(opts!(
        "depot_unsupported_locale_total",
        "Requests asking for a locale that is not available"
    ))
    .unwrap()
});

pub static LOGINS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(opts!("depot_logins_total", "Successful logins")).unwrap()
});

pub static FAILED_LOGINS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(opts!(
        "depot_failed_logins_total",
        "Login attempts with an unknown user or wrong password"
    ))
    .unwrap()
});

pub fn gather_metrics() -> Result<String> {
    let mut buffer = vec![];
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder.encode(&metric_families, &mut buffer)?;

    Ok(String::from_utf8(buffer)?)
}
