//! Line terminator handling shared by the indexer and the locator. `\n`, `\r\n` and a lone `\r`
//! all end a line.

use std::{
    future::poll_fn,
    io,
    pin::Pin,
    task::Poll,
};

use async_std::io::BufRead;

/// Reads a single line from `reader` and appends its content, without the terminator, to `buf`.
/// Reading stops right after the terminator, so at most one byte past a `\r` is looked at.
///
/// Returns the length of the lines content and the length of its terminator, which is 0 if the
/// line ends at EOF. `(0, 0)` means `reader` was already at EOF.
pub(crate) async fn read_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<(usize, usize)>
where
    R: BufRead + Unpin,
{
    let mut len = 0;
    let mut after_cr = false;

    poll_fn(|cx| loop {
        let available = match Pin::new(&mut *reader).poll_fill_buf(cx) {
            Poll::Ready(Ok(available)) => available,
            Poll::Ready(Err(err)) => return Poll::Ready(Err(err)),
            Poll::Pending => return Poll::Pending,
        };

        if after_cr {
            // Only a `\n` directly following the `\r` belongs to the terminator
            let crlf = available.first() == Some(&b'\n');
            if crlf {
                Pin::new(&mut *reader).consume(1);
                return Poll::Ready(Ok((len, 2)));
            }
            return Poll::Ready(Ok((len, 1)));
        }

        if available.is_empty() {
            return Poll::Ready(Ok((len, 0)));
        }

        match available.iter().position(|b| *b == b'\n' || *b == b'\r') {
            Some(pos) => {
                buf.extend_from_slice(&available[..pos]);
                len += pos;
                let is_cr = available[pos] == b'\r';
                Pin::new(&mut *reader).consume(pos + 1);

                if !is_cr {
                    return Poll::Ready(Ok((len, 1)));
                }
                after_cr = true;
            }
            None => {
                let n = available.len();
                buf.extend_from_slice(available);
                len += n;
                Pin::new(&mut *reader).consume(n);
            }
        }
    })
    .await
}
