//! Streaming gzip decompression

use flate2::read::MultiGzDecoder;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Decompress the gzip file at `src` into a new file at `dest`.
///
/// Concatenated gzip members are decoded as one stream. On failure the
/// partially written `dest` is removed.
pub fn decompress(src: &Path, dest: &Path) -> io::Result<()> {
    debug!("Gunzipping {} into {}", src.display(), dest.display());

    let input = File::open(src)?;
    let mut decoder = MultiGzDecoder::new(BufReader::new(input));

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let output = options.open(dest)?;

    let result = (|| {
        let mut writer = BufWriter::new(output);
        io::copy(&mut decoder, &mut writer)?;
        writer.flush()?;
        writer.get_ref().sync_all()
    })();

    if result.is_err() {
        let _ = fs::remove_file(dest);
    }
    result
}
