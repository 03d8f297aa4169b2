use std::{cell::RefCell, ffi::OsStr};

/// Cycle budget for `run` when neither `--cycles` nor `CHIP3_MAX_CYCLES` is given.
pub const DEFAULT_MAX_CYCLES: u64 = 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Env {
    max_cycles: u64,
    trace_enabled: bool,
}

thread_local! {
    /// Must only be mutated within `set_env`
    static ENV: RefCell<Option<Env>> = const { RefCell::new(None) };
}

pub fn init() {
    set_env(Env::from_vars());
}

pub fn max_cycles() -> u64 {
    with_env(|env| env.max_cycles)
}

pub fn is_trace_enabled() -> bool {
    with_env(|env| env.trace_enabled)
}

impl Env {
    fn from_vars() -> Self {
        Env {
            max_cycles: var_parse("CHIP3_MAX_CYCLES").unwrap_or(DEFAULT_MAX_CYCLES),
            trace_enabled: var_is("CHIP3_TRACE", "1"),
        }
    }
}

fn set_env(value: Env) {
    ENV.with(|env| store(env, value));
}

fn with_env<F, R>(callback: F) -> R
where
    F: Fn(&Env) -> R,
{
    ENV.with(|env| load(env, callback))
}

fn store(cell: &RefCell<Option<Env>>, value: Env) {
    let mut env = cell.borrow_mut();
    assert!(
        env.is_none(),
        "tried to initialize environment state multiple times"
    );
    *env = Some(value);
}

fn load<F, R>(cell: &RefCell<Option<Env>>, callback: F) -> R
where
    F: Fn(&Env) -> R,
{
    let env = cell.borrow();
    let env = env.unwrap_or_else(|| {
        panic!("tried to access environment state before initialization");
    });
    callback(&env)
}

fn var_is(name: impl AsRef<OsStr>, value: impl AsRef<str>) -> bool {
    std::env::var(name.as_ref()).is_ok_and(|v| v == value.as_ref())
}

/// Value of `name` if it is set and parses. Garbage is ignored with a warning.
fn var_parse(name: &str) -> Option<u64> {
    let value = std::env::var(name).ok()?;
    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            log::warn!("ignoring {name}={value:?}: not a cycle count");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: Env = Env {
        max_cycles: 77,
        trace_enabled: true,
    };

    #[test]
    fn reads_after_store() {
        let cell = RefCell::new(None);
        store(&cell, SAMPLE);
        assert_eq!(load(&cell, |env| env.max_cycles), 77);
        assert!(load(&cell, |env| env.trace_enabled));
    }

    #[test]
    #[should_panic(expected = "before initialization")]
    fn read_before_store_panics() {
        let cell = RefCell::new(None);
        load(&cell, |env| env.max_cycles);
    }

    #[test]
    #[should_panic(expected = "multiple times")]
    fn store_twice_panics() {
        let cell = RefCell::new(None);
        store(&cell, SAMPLE);
        store(&cell, SAMPLE);
    }

    #[test]
    fn unset_variable_is_none() {
        assert_eq!(var_parse("CHIP3_SURELY_UNSET_VARIABLE"), None);
    }
}
