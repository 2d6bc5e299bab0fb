use rand::Rng;

pub(crate) const PIN_LEN: usize = 6;
const PIN_MIN: u32 = 100_000;
const PIN_MAX: u32 = 999_999;

/// Six-digit numeric PIN without a leading zero.
pub(crate) fn generate_pin() -> String {
    let mut rng = rand::thread_rng();
    rng.gen_range(PIN_MIN..=PIN_MAX).to_string()
}

pub(crate) fn is_valid_pin(pin: &str) -> bool {
    pin.len() == PIN_LEN && pin.bytes().all(|byte| byte.is_ascii_digit())
}

/// Draws PINs from `generate` until one is not taken, giving up after
/// `max_attempts` draws.
pub(crate) fn allocate_pin(
    max_attempts: u32,
    mut generate: impl FnMut() -> String,
    mut is_taken: impl FnMut(&str) -> bool,
) -> Option<String> {
    for attempt in 1..=max_attempts {
        let pin = generate();
        if !is_taken(&pin) {
            return Some(pin);
        }
        tracing::debug!(attempt, "PIN collision, drawing again");
    }
    None
}
