use wavesynth_core::{instrument::BackendKind, ChannelCount};

use crate::demo::backend_name;

#[inline(always)]
pub fn audio_channels_parser(s: &str) -> Result<ChannelCount, String> {
    match s {
        "mono" => Ok(ChannelCount::Mono),
        "stereo" => Ok(ChannelCount::Stereo),
        _ => Err("Invalid channel count".to_string()),
    }
}

/// Parses a backend name, or `all` for every backend.
pub fn backends_parser(s: &str) -> Result<Vec<BackendKind>, String> {
    if s == "all" {
        return Ok(BackendKind::ALL.to_vec());
    }
    BackendKind::ALL
        .into_iter()
        .find(|kind| backend_name(*kind) == s)
        .map(|kind| vec![kind])
        .ok_or_else(|| format!("Unknown backend {s}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backends_parser() {
        assert_eq!(backends_parser("all").unwrap().len(), 4);
        assert_eq!(backends_parser("chip").unwrap(), vec![BackendKind::Chip]);
        assert!(backends_parser("fm").is_err());
    }
}
