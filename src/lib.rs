use std::io;

use tracing::warn;

pub mod coordinate;
pub mod ese;
pub mod gate;
pub mod geometry;
pub mod navaid;
pub mod options;
pub mod projection;

fn read_to_string(contents: &[u8]) -> Result<String, io::Error> {
    String::from_utf8(contents.to_vec()).or_else(|_| {
        let (string, _, errors) = encoding_rs::WINDOWS_1252.decode(contents);
        if errors {
            warn!("errors while decoding win-1252");
        }
        Ok(string.to_string())
    })
}

/// Strips decoding artifacts and surrounding whitespace from a raw line.
fn clean_line(line: &str) -> String {
    line.replace(['\u{fffd}', '\r'], "").trim().to_string()
}

/// Removes artifacts a single colon-separated field may still carry.
fn clean_field(field: &str) -> String {
    field.replace(['\u{fffd}', '\r'], "")
}
