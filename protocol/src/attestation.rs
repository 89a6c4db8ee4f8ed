//! # Sensor Attestation
//!
//! Every transfer carries a "physics signature": a SHA-512 digest of the
//! sensor context the originating device observed at the moment of payment —
//! motion, ambient sound, light, barometric pressure, a timestamp, and the
//! device id. The digest rides inside the signed payload, so tampering with
//! either the sensor readings or the digest after signing breaks the Ed25519
//! signature, and tampering with the readings alone breaks the digest.
//!
//! The attestation is tamper-*evidence*, not proof of physical presence: we
//! never validate that the readings are plausible, only that they are the
//! readings the sender committed to. See [`verify`].
//!
//! Hardware integration goes through the [`SensorOracle`] trait. Production
//! MobilePOS terminals plug real sensors in; everything else (demo seeding,
//! tests, the reference node) uses [`SimulatedSensorOracle`].

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::crypto::{canonical_json, sha512_hex};

// ---------------------------------------------------------------------------
// Sensor Readings
// ---------------------------------------------------------------------------

/// Accelerometer and gyroscope readings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionReading {
    /// Acceleration along each axis, in g.
    pub acceleration_x: f64,
    pub acceleration_y: f64,
    pub acceleration_z: f64,
    /// Device orientation, in degrees.
    pub rotation_alpha: f64,
    pub rotation_beta: f64,
    pub rotation_gamma: f64,
}

/// Ambient audio readings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundReading {
    /// Dominant frequency, in Hz.
    pub frequency: f64,
    /// Normalized amplitude in `[0, 1]`.
    pub amplitude: f64,
    /// Sound pressure level, in dB.
    pub decibels: f64,
}

/// Ambient light readings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightReading {
    pub lux: f64,
    /// Correlated color temperature, in Kelvin.
    pub color_temperature: f64,
    /// Normalized brightness in `[0, 1]`.
    pub brightness: f64,
}

/// Barometric readings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PressureReading {
    /// Atmospheric pressure, in hectopascals.
    pub hpa: f64,
    /// Estimated altitude, in meters.
    pub altitude: f64,
}

/// The complete sensor snapshot bound into a transfer.
///
/// Field names and nesting are part of the wire contract: the digest is
/// computed over the canonical JSON form of this structure, so renaming a
/// field invalidates every attestation ever issued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttestationData {
    pub motion: MotionReading,
    pub sound: SoundReading,
    pub light: LightReading,
    pub pressure: PressureReading,
    /// ISO-8601 capture time, as reported by the device.
    pub timestamp: String,
    pub device_id: String,
}

// ---------------------------------------------------------------------------
// Digest
// ---------------------------------------------------------------------------

/// Computes the attestation digest: SHA-512 over the canonical JSON form of
/// the sensor snapshot, hex-encoded.
pub fn digest(data: &AttestationData) -> String {
    // AttestationData serializes to plain maps and numbers; to_value cannot
    // fail for it, and an empty object digest would fail verification anyway.
    let value = serde_json::to_value(data).unwrap_or(Value::Null);
    sha512_hex(canonical_json(&value).as_bytes())
}

/// Recomputes the digest for `data` and compares it against `claimed`.
///
/// Returns `false` on any mismatch. A failed attestation is a normal
/// verification outcome, never an error.
pub fn verify(data: &AttestationData, claimed: &str) -> bool {
    digest(data) == claimed
}

// ---------------------------------------------------------------------------
// Sensor Oracle
// ---------------------------------------------------------------------------

/// Source of sensor snapshots.
///
/// The protocol never cares where readings come from; it only binds them into
/// the signed payload. Implementations decide between real hardware and
/// simulation.
pub trait SensorOracle: Send + Sync {
    /// Captures a sensor snapshot for the device initiating a transfer.
    fn capture(&self) -> AttestationData;
}

/// Oracle that fabricates plausible readings.
///
/// Used by the reference node and the demo seeder, where no physical sensors
/// exist. Ranges mirror what real hardware reports: accelerations within a
/// couple of g, audible frequencies, indoor light levels, sea-level-ish
/// pressure.
#[derive(Debug, Clone, Default)]
pub struct SimulatedSensorOracle;

impl SensorOracle for SimulatedSensorOracle {
    fn capture(&self) -> AttestationData {
        let mut rng = rand::thread_rng();
        AttestationData {
            motion: MotionReading {
                acceleration_x: round_to(rng.gen_range(-2.0..2.0), 3),
                acceleration_y: round_to(rng.gen_range(-2.0..2.0), 3),
                acceleration_z: round_to(rng.gen_range(-2.0..2.0), 3),
                rotation_alpha: round_to(rng.gen_range(0.0..360.0), 2),
                rotation_beta: round_to(rng.gen_range(-180.0..180.0), 2),
                rotation_gamma: round_to(rng.gen_range(-90.0..90.0), 2),
            },
            sound: SoundReading {
                frequency: round_to(rng.gen_range(20.0..20000.0), 1),
                amplitude: round_to(rng.gen_range(0.0..1.0), 3),
                decibels: round_to(rng.gen_range(30.0..120.0), 1),
            },
            light: LightReading {
                lux: round_to(rng.gen_range(0.0..1000.0), 1),
                color_temperature: round_to(rng.gen_range(2000.0..6500.0), 0),
                brightness: round_to(rng.gen_range(0.0..1.0), 3),
            },
            pressure: PressureReading {
                hpa: round_to(rng.gen_range(900.0..1100.0), 2),
                altitude: round_to(rng.gen_range(0.0..5000.0), 1),
            },
            timestamp: Utc::now().to_rfc3339(),
            device_id: format!("device_{}", rng.gen_range(1000..10000)),
        }
    }
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ATTESTATION_DIGEST_LENGTH;

    fn sample() -> AttestationData {
        AttestationData {
            motion: MotionReading {
                acceleration_x: 0.12,
                acceleration_y: -1.5,
                acceleration_z: 0.98,
                rotation_alpha: 180.0,
                rotation_beta: 45.5,
                rotation_gamma: -30.25,
            },
            sound: SoundReading {
                frequency: 440.0,
                amplitude: 0.5,
                decibels: 62.1,
            },
            light: LightReading {
                lux: 310.5,
                color_temperature: 4500.0,
                brightness: 0.7,
            },
            pressure: PressureReading {
                hpa: 1013.25,
                altitude: 76.0,
            },
            timestamp: "2026-02-14T09:30:00+00:00".into(),
            device_id: "device_4242".into(),
        }
    }

    #[test]
    fn digest_is_hex_sha512() {
        let d = digest(&sample());
        assert_eq!(d.len(), ATTESTATION_DIGEST_LENGTH * 2);
        assert!(d.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn digest_is_deterministic() {
        assert_eq!(digest(&sample()), digest(&sample()));
    }

    #[test]
    fn verify_accepts_matching_digest() {
        let data = sample();
        let d = digest(&data);
        assert!(verify(&data, &d));
    }

    #[test]
    fn verify_rejects_tampered_readings() {
        let data = sample();
        let d = digest(&data);
        let mut tampered = data;
        tampered.pressure.hpa = 999.99;
        assert!(!verify(&tampered, &d));
    }

    #[test]
    fn verify_rejects_wrong_digest() {
        assert!(!verify(&sample(), "deadbeef"));
        assert!(!verify(&sample(), ""));
    }

    #[test]
    fn simulated_oracle_produces_in_range_readings() {
        let data = SimulatedSensorOracle.capture();
        assert!((-2.0..=2.0).contains(&data.motion.acceleration_x));
        assert!((20.0..=20000.0).contains(&data.sound.frequency));
        assert!((0.0..=1000.0).contains(&data.light.lux));
        assert!((900.0..=1100.0).contains(&data.pressure.hpa));
        assert!(data.device_id.starts_with("device_"));
    }

    #[test]
    fn simulated_oracle_snapshots_are_distinct() {
        let oracle = SimulatedSensorOracle;
        let a = oracle.capture();
        let b = oracle.capture();
        // Twelve independent random readings colliding would be remarkable.
        assert_ne!(digest(&a), digest(&b));
    }

    #[test]
    fn digest_survives_serde_round_trip() {
        let data = sample();
        let d = digest(&data);
        let json = serde_json::to_string(&data).unwrap();
        let back: AttestationData = serde_json::from_str(&json).unwrap();
        assert!(verify(&back, &d));
    }
}
