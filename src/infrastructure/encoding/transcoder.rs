//! Streams a UTF-8 file into a legacy encoding such as EUC-KR.

use crate::domain::errors::{ExportError, Result};
use crate::domain::export_options::UnencodablePolicy;
use encoding_rs::{DecoderResult, Encoder, EncoderResult, Encoding, UTF_8};
use log::warn;
use std::fs::File;
use std::io::{BufWriter, ErrorKind, Read, Write};
use std::path::Path;

const CHUNK_SIZE: usize = 64 * 1024;

/// Byte counts for one transcoded stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranscodeStats {
    pub bytes_read: u64,
    pub bytes_written: u64,
    /// Characters replaced under `UnencodablePolicy::Substitute`.
    pub substitutions: usize,
}

pub struct Transcoder {
    encoding: &'static Encoding,
    policy: UnencodablePolicy,
    replacement: Vec<u8>,
}

impl Transcoder {
    /// Fails if `replacement` itself has no representation in `encoding`.
    pub fn new(
        encoding: &'static Encoding,
        policy: UnencodablePolicy,
        replacement: char,
    ) -> Result<Self> {
        let text = replacement.to_string();
        let (bytes, _, unmappable) = encoding.encode(&text);
        if unmappable {
            return Err(ExportError::ConfigError(format!(
                "replacement {:?} cannot be represented in {}",
                replacement,
                encoding.name()
            )));
        }
        Ok(Self {
            encoding,
            policy,
            replacement: bytes.into_owned(),
        })
    }

    pub fn encoding_name(&self) -> &'static str {
        self.encoding.name()
    }

    /// Transcodes `source` into a newly created `dest`.
    ///
    /// The caller owns both paths; on failure `dest` may be partially written.
    pub fn transcode(&self, source: &Path, dest: &Path) -> Result<TranscodeStats> {
        let reader = File::open(source)
            .map_err(|e| ExportError::transcode(source.display().to_string(), e))?;
        let file = File::create(dest)
            .map_err(|e| ExportError::transcode(dest.display().to_string(), e))?;

        let mut writer = BufWriter::with_capacity(128 * 1024, file);
        let stats = self.transcode_stream(reader, &mut writer)?;
        let file = writer
            .into_inner()
            .map_err(|e| ExportError::transcode(dest.display().to_string(), e.error()))?;
        file.sync_all()
            .map_err(|e| ExportError::transcode(dest.display().to_string(), e))?;

        if stats.substitutions > 0 {
            warn!(
                "{}: {} character(s) replaced, no {} representation",
                dest.display(),
                stats.substitutions,
                self.encoding.name()
            );
        }
        Ok(stats)
    }

    /// Decodes UTF-8 from `reader` chunk by chunk and writes the re-encoded
    /// bytes to `writer`.
    pub fn transcode_stream<R: Read, W: Write>(
        &self,
        mut reader: R,
        mut writer: W,
    ) -> Result<TranscodeStats> {
        let mut decoder = UTF_8.new_decoder_without_bom_handling();
        let mut encoder = self.encoding.new_encoder();
        let mut input = vec![0u8; CHUNK_SIZE];
        let mut text = String::with_capacity(CHUNK_SIZE + 4);
        let mut output = Vec::with_capacity(CHUNK_SIZE * 2);
        let mut stats = TranscodeStats::default();
        let mut encoded: u64 = 0;

        loop {
            let n = match reader.read(&mut input) {
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(ExportError::transcode("<input>", e)),
            };
            let last = n == 0;

            // Characters split across chunks stay buffered inside the decoder,
            // so `text` always starts at a character boundary.
            let mut src = &input[..n];
            loop {
                let needed = decoder
                    .max_utf8_buffer_length_without_replacement(src.len())
                    .unwrap_or(src.len() * 3 + 4);
                text.reserve(needed);
                let (result, read) =
                    decoder.decode_to_string_without_replacement(src, &mut text, last);
                src = &src[read..];
                match result {
                    DecoderResult::InputEmpty => break,
                    DecoderResult::OutputFull => continue,
                    DecoderResult::Malformed(_, _) => {
                        let at = stats.bytes_read + (n - src.len()) as u64;
                        return Err(ExportError::transcode(
                            "<input>",
                            format!("invalid UTF-8 near byte {}", at),
                        ));
                    }
                }
            }
            stats.bytes_read += n as u64;

            self.encode_text(&mut encoder, &text, encoded, last, &mut output, &mut stats)?;
            encoded += text.len() as u64;
            writer
                .write_all(&output)
                .map_err(|e| ExportError::transcode("<output>", e))?;
            stats.bytes_written += output.len() as u64;
            output.clear();
            text.clear();

            if last {
                break;
            }
        }

        writer
            .flush()
            .map_err(|e| ExportError::transcode("<output>", e))?;
        Ok(stats)
    }

    /// `text_offset` is the byte position of `text` within the whole input.
    fn encode_text(
        &self,
        encoder: &mut Encoder,
        text: &str,
        text_offset: u64,
        last: bool,
        output: &mut Vec<u8>,
        stats: &mut TranscodeStats,
    ) -> Result<()> {
        let mut pending = text;
        loop {
            let needed = encoder
                .max_buffer_length_from_utf8_without_replacement(pending.len())
                .unwrap_or(pending.len() * 2 + 16);
            output.reserve(needed);
            let (result, read) =
                encoder.encode_from_utf8_to_vec_without_replacement(pending, output, last);
            pending = &pending[read..];

            match result {
                EncoderResult::InputEmpty => return Ok(()),
                EncoderResult::OutputFull => continue,
                EncoderResult::Unmappable(ch) => match self.policy {
                    UnencodablePolicy::Fail => {
                        let consumed = text.len() - pending.len() - ch.len_utf8();
                        return Err(ExportError::UnencodableCharacter {
                            ch,
                            offset: text_offset + consumed as u64,
                            encoding: self.encoding.name().to_string(),
                        });
                    }
                    UnencodablePolicy::Substitute => {
                        output.extend_from_slice(&self.replacement);
                        stats.substitutions += 1;
                    }
                },
            }
        }
    }
}
