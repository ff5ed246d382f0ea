//! Audio container handling for answer recordings.
//!
//! Browser clients record in whatever `MediaRecorder` gives them (usually
//! WebM/Opus); the CLI hands over files. The transcription endpoint accepts
//! common containers directly, so normalization is: wrap raw PCM into a WAV
//! container locally, pass accepted containers through, reject the rest
//! before a worker slot is spent on them.

use crate::error::{VoiceError, VoiceResult};
use std::io::Write;

/// Encodings a recording may arrive in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioEncoding {
    Wav,
    Webm,
    Ogg,
    Mp4,
    Mp3,
    /// Raw 16-bit little-endian mono PCM at 16 kHz (no container).
    Pcm16k,
}

impl AudioEncoding {
    /// Parse a MIME hint (e.g. `audio/webm;codecs=opus`). Unknown types
    /// are rejected here rather than deep in a worker.
    pub fn from_mime(mime: &str) -> VoiceResult<Self> {
        let base = mime
            .split(';')
            .next()
            .unwrap_or(mime)
            .trim()
            .to_ascii_lowercase();
        match base.as_str() {
            "audio/wav" | "audio/x-wav" | "audio/wave" => Ok(Self::Wav),
            "audio/webm" => Ok(Self::Webm),
            "audio/ogg" => Ok(Self::Ogg),
            "audio/mp4" => Ok(Self::Mp4),
            "audio/mpeg" | "audio/mp3" => Ok(Self::Mp3),
            "audio/pcm" | "audio/l16" => Ok(Self::Pcm16k),
            other => Err(VoiceError::UnsupportedEncoding(other.to_string())),
        }
    }

    /// MIME type for upload.
    pub fn mime(&self) -> &'static str {
        match self {
            Self::Wav | Self::Pcm16k => "audio/wav",
            Self::Webm => "audio/webm",
            Self::Ogg => "audio/ogg",
            Self::Mp4 => "audio/mp4",
            Self::Mp3 => "audio/mpeg",
        }
    }

    /// File name for multipart upload (the API keys format off the extension).
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Wav | Self::Pcm16k => "audio.wav",
            Self::Webm => "audio.webm",
            Self::Ogg => "audio.ogg",
            Self::Mp4 => "audio.mp4",
            Self::Mp3 => "audio.mp3",
        }
    }

    /// Guess from a file extension (CLI path input).
    pub fn from_extension(path: &str) -> VoiceResult<Self> {
        let ext = path
            .rsplit('.')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match ext.as_str() {
            "wav" => Ok(Self::Wav),
            "webm" => Ok(Self::Webm),
            "ogg" | "oga" => Ok(Self::Ogg),
            "mp4" | "m4a" => Ok(Self::Mp4),
            "mp3" => Ok(Self::Mp3),
            other => Err(VoiceError::UnsupportedEncoding(format!(".{}", other))),
        }
    }
}

/// Normalize a recording for upload: raw PCM gets a WAV header, accepted
/// containers pass through untouched.
pub fn normalize_for_upload(audio: Vec<u8>, encoding: AudioEncoding) -> (Vec<u8>, AudioEncoding) {
    match encoding {
        AudioEncoding::Pcm16k => (pcm16_to_wav(&audio, 16_000), AudioEncoding::Wav),
        other => (audio, other),
    }
}

/// Wrap 16-bit LE mono PCM samples into a WAV container.
pub fn pcm16_to_wav(pcm: &[u8], sample_rate: u32) -> Vec<u8> {
    let data_len = pcm.len() as u32;
    let file_len = 44 + data_len;

    let mut buf = Vec::with_capacity(file_len as usize);
    // RIFF header
    buf.write_all(b"RIFF").unwrap();
    buf.write_all(&(file_len - 8).to_le_bytes()).unwrap();
    buf.write_all(b"WAVE").unwrap();
    // fmt subchunk
    buf.write_all(b"fmt ").unwrap();
    buf.write_all(&16u32.to_le_bytes()).unwrap(); // subchunk1 size
    buf.write_all(&1u16.to_le_bytes()).unwrap(); // PCM
    buf.write_all(&1u16.to_le_bytes()).unwrap(); // mono
    buf.write_all(&sample_rate.to_le_bytes()).unwrap();
    buf.write_all(&(sample_rate * 2).to_le_bytes()).unwrap(); // byte rate
    buf.write_all(&2u16.to_le_bytes()).unwrap(); // block align
    buf.write_all(&16u16.to_le_bytes()).unwrap(); // bits per sample
    // data subchunk
    buf.write_all(b"data").unwrap();
    buf.write_all(&data_len.to_le_bytes()).unwrap();
    buf.write_all(pcm).unwrap();
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_parsing_strips_codec_params() {
        assert_eq!(
            AudioEncoding::from_mime("audio/webm;codecs=opus").unwrap(),
            AudioEncoding::Webm
        );
        assert_eq!(
            AudioEncoding::from_mime("AUDIO/WAV").unwrap(),
            AudioEncoding::Wav
        );
    }

    #[test]
    fn unknown_mime_is_rejected() {
        let err = AudioEncoding::from_mime("video/quicktime").unwrap_err();
        assert!(matches!(err, VoiceError::UnsupportedEncoding(_)));
    }

    #[test]
    fn pcm_gets_wav_header() {
        let pcm = vec![0u8; 320];
        let (wav, enc) = normalize_for_upload(pcm, AudioEncoding::Pcm16k);
        assert_eq!(enc, AudioEncoding::Wav);
        assert_eq!(&wav[..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(wav.len(), 44 + 320);
    }

    #[test]
    fn containers_pass_through() {
        let webm = vec![1u8, 2, 3];
        let (out, enc) = normalize_for_upload(webm.clone(), AudioEncoding::Webm);
        assert_eq!(out, webm);
        assert_eq!(enc, AudioEncoding::Webm);
    }

    #[test]
    fn extension_guessing() {
        assert_eq!(
            AudioEncoding::from_extension("answer.webm").unwrap(),
            AudioEncoding::Webm
        );
        assert!(AudioEncoding::from_extension("notes.txt").is_err());
    }
}
