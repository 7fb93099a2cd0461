//! Cross-crate integration suites, all driven against the emulated hub.

#[cfg(test)]
mod support;

#[cfg(test)]
mod message_roundtrip;

#[cfg(test)]
mod pool_e2e;

#[cfg(test)]
mod rendezvous_stress;

#[cfg(test)]
mod session_expect;
