use crate::{
    dav::{
        Error,
        fs::{FSResourceService, FSResourceServicePath},
    },
    filesystem::{DavMetadata, Filesystem, FilesystemProvider},
};
use axum::{
    body::{Body, Bytes},
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use axum_extra::TypedHeader;
use headers::Range;
use http::{HeaderValue, StatusCode, header};
use httpdate::HttpDate;
use percent_encoding::{AsciiSet, CONTROLS, NON_ALPHANUMERIC, percent_encode};
use std::{io::SeekFrom, ops::Bound};
use tokio::io::{AsyncReadExt, AsyncSeekExt};

const CHUNK_SIZE: usize = 65_536;
const QUOTED: &AsciiSet = &CONTROLS.add(b'"').add(b'\\');

/// Resolves the first satisfiable range to `(offset, length)`.
fn byte_range(range: &Range, len: u64) -> Option<(u64, u64)> {
    let (start, end) = range.satisfiable_ranges(len).next()?;
    let start = match start {
        Bound::Included(start) => start,
        Bound::Excluded(start) => start + 1,
        Bound::Unbounded => 0,
    };
    let end = match end {
        Bound::Included(end) => end.saturating_add(1).min(len),
        Bound::Excluded(end) => end.min(len),
        Bound::Unbounded => len,
    };
    (start < end).then(|| (start, end - start))
}

fn content_disposition(filename: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        percent_encode(filename.as_bytes(), QUOTED),
        percent_encode(filename.as_bytes(), NON_ALPHANUMERIC)
    ))
    .ok()
}

// Not using tower-http's ServeFile since the filesystem is abstracted
pub async fn route_get<FSP: FilesystemProvider>(
    State(resource_service): State<FSResourceService<FSP>>,
    Path(path): Path<FSResourceServicePath>,
    range: Option<TypedHeader<Range>>,
) -> Result<Response, Error> {
    let filesystem = resource_service.get_filesystem(&path.mount).await?;
    let md = filesystem.metadata(&path.path).await?;
    if md.is_dir() {
        return Ok(StatusCode::METHOD_NOT_ALLOWED.into_response());
    }
    let mut file = filesystem.get_file(&path.path).await?;

    let mut res = Response::builder().header(header::ACCEPT_RANGES, "bytes");
    if let Some(content_type) = mime_guess::from_path(path.path.as_str()).first_raw() {
        res = res.header(header::CONTENT_TYPE, content_type);
    }
    if let Some(disposition) = content_disposition(path.path.file_name()) {
        res = res.header(header::CONTENT_DISPOSITION, disposition);
    }
    res = res.header(
        header::LAST_MODIFIED,
        HttpDate::from(md.modified()).to_string(),
    );

    let mut length = md.len();
    let mut offset = 0;

    if let Some(TypedHeader(range)) = range {
        let Some((range_offset, range_length)) = byte_range(&range, md.len()) else {
            return Ok(Response::builder()
                .status(StatusCode::RANGE_NOT_SATISFIABLE)
                .header(header::CONTENT_RANGE, format!("bytes */{}", md.len()))
                .body(Body::empty())
                .map_err(|err| Error::BadRequest(err.to_string()))?);
        };
        offset = range_offset;
        length = range_length;
        res = res
            .status(StatusCode::PARTIAL_CONTENT)
            .header(
                header::CONTENT_RANGE,
                format!("bytes {}-{}/{}", offset, offset + length - 1, md.len()),
            );
    }

    file.seek(SeekFrom::Start(offset)).await?;
    let stream = futures::stream::try_unfold(file.take(length), |mut reader| async move {
        let mut buf = vec![0u8; CHUNK_SIZE];
        let read = reader.read(&mut buf).await?;
        if read == 0 {
            return Ok::<_, std::io::Error>(None);
        }
        buf.truncate(read);
        Ok(Some((Bytes::from(buf), reader)))
    });

    res.header(header::CONTENT_LENGTH, length)
        .body(Body::from_stream(stream))
        .map_err(|err| Error::BadRequest(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{byte_range, content_disposition};
    use headers::{HeaderMapExt, Range};
    use http::{HeaderMap, HeaderValue, header};
    use rstest::rstest;

    fn range(value: &'static str) -> Range {
        let mut headers = HeaderMap::new();
        headers.insert(header::RANGE, HeaderValue::from_static(value));
        headers.typed_get::<Range>().unwrap()
    }

    #[rstest]
    #[case::prefix("bytes=0-9", Some((0, 10)))]
    #[case::open_end("bytes=90-", Some((90, 10)))]
    #[case::suffix("bytes=-5", Some((95, 5)))]
    #[case::beyond("bytes=100-", None)]
    fn ranges(#[case] header: &'static str, #[case] expected: Option<(u64, u64)>) {
        assert_eq!(byte_range(&range(header), 100), expected);
    }

    #[test]
    fn disposition_is_encoded() {
        let value = content_disposition("Bericht \"Q1\" ä.txt").unwrap();
        assert_eq!(
            value.to_str().unwrap(),
            "attachment; filename=\"Bericht %22Q1%22 %C3%A4.txt\"; filename*=UTF-8''Bericht%20%22Q1%22%20%C3%A4%2Etxt"
        );
    }
}
