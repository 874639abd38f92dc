use crate::MAX_UPLOAD_BYTES;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::{Engine as _, engine::general_purpose};
use image::DynamicImage;
use photomosaic::core_modules::utils::image_helper::encode_jpeg;
use photomosaic::{MosaicError, MosaicPipeline};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

const JPEG_QUALITY: u8 = 100;

const UPLOAD_FORM: &str = r#"<!DOCTYPE html>
<html>
<head><title>Photomosaic</title></head>
<body>
  <h2>Photomosaic</h2>
  <form action="/mosaic" method="post" enctype="multipart/form-data">
    <p><input type="file" name="image" accept="image/*" required></p>
    <p>
      <label for="tile_size">Tile size</label>
      <select name="tile_size" id="tile_size">
        <option value="10">10</option>
        <option value="15">15</option>
        <option value="20">20</option>
        <option value="25">25</option>
        <option value="50">50</option>
        <option value="100">100</option>
      </select>
    </p>
    <p><button type="submit">Generate mosaic</button></p>
  </form>
</body>
</html>
"#;

/// Shared by every request; the pipeline owns the master index.
#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<MosaicPipeline>,
}

impl AppState {
    pub fn new(pipeline: MosaicPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }

    pub fn pipeline(&self) -> &MosaicPipeline {
        &self.pipeline
    }
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Malformed upload: {0}")]
    Upload(String),
    #[error("No image was uploaded")]
    MissingImage,
    #[error("Uploaded file is not a readable image: {0}")]
    Decode(image::ImageError),
    #[error("Tile size must be a positive integer, got {0:?}")]
    TileSize(String),
    #[error(transparent)]
    Mosaic(#[from] MosaicError),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::Upload(_) | ServerError::MissingImage | ServerError::Decode(_) | ServerError::TileSize(_) => {
                StatusCode::BAD_REQUEST
            }
            ServerError::Mosaic(MosaicError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            ServerError::Mosaic(MosaicError::TileIndexExhausted) => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::Mosaic(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        } else {
            warn!(error = %self, %status, "Request rejected");
        }
        (status, self.to_string()).into_response()
    }
}

/// The fields of a mosaic upload form.
#[derive(Debug, Default, Clone)]
pub struct Upload {
    pub image: Option<Bytes>,
    pub tile_size: Option<String>,
}

/// A finished job, ready for either the HTML page or the JSON API.
#[derive(Debug, Clone, Serialize)]
pub struct MosaicOutcome {
    pub width: u32,
    pub height: u32,
    pub tile_size: u32,
    /// Human-readable elapsed time.
    pub duration: String,
    pub duration_ms: u64,
    /// Base64 JPEG of the uploaded image.
    pub original: String,
    /// Base64 JPEG of the mosaic.
    pub mosaic: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/mosaic", post(mosaic_page))
        .route("/api/mosaic", post(mosaic_api))
        .route("/healthz", get(|| async { "ok" }))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(UPLOAD_FORM)
}

async fn mosaic_page(State(state): State<AppState>, multipart: Multipart) -> Result<Html<String>, ServerError> {
    let upload = read_upload(multipart).await?;
    let outcome = process(&state, upload).await?;
    Ok(Html(render_results(&outcome)))
}

async fn mosaic_api(State(state): State<AppState>, multipart: Multipart) -> Result<Json<MosaicOutcome>, ServerError> {
    let upload = read_upload(multipart).await?;
    Ok(Json(process(&state, upload).await?))
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload, ServerError> {
    let mut upload = Upload::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::Upload(e.to_string()))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("image") => {
                upload.image = Some(field.bytes().await.map_err(|e| ServerError::Upload(e.to_string()))?);
            }
            Some("tile_size") => {
                upload.tile_size = Some(field.text().await.map_err(|e| ServerError::Upload(e.to_string()))?);
            }
            _ => {}
        }
    }
    Ok(upload)
}

/// Blank or missing means `default`.
pub fn parse_tile_size(raw: Option<&str>, default: u32) -> Result<u32, ServerError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(default),
        Some(text) => match text.parse::<u32>() {
            Ok(size) if size > 0 => Ok(size),
            _ => Err(ServerError::TileSize(text.to_string())),
        },
    }
}

pub async fn process(state: &AppState, upload: Upload) -> Result<MosaicOutcome, ServerError> {
    let pipeline = state.pipeline();
    let bytes = upload.image.filter(|b| !b.is_empty()).ok_or(ServerError::MissingImage)?;
    let tile_size = parse_tile_size(upload.tile_size.as_deref(), pipeline.config().tile_size)?;
    let source = image::load_from_memory(&bytes).map_err(ServerError::Decode)?;
    info!(
        width = source.width(),
        height = source.height(),
        tile_size,
        bytes = bytes.len(),
        "Mosaic requested"
    );

    let report = pipeline.generate_with_tile_size(&source, tile_size).await?;
    let (width, height) = report.image.dimensions();
    let original = encode_base64_jpeg(&source)?;
    let mosaic = encode_base64_jpeg(&DynamicImage::ImageRgba8(report.image))?;

    Ok(MosaicOutcome {
        width,
        height,
        tile_size,
        duration: format!("{:?}", report.elapsed),
        duration_ms: u64::try_from(report.elapsed.as_millis()).unwrap_or(u64::MAX),
        original,
        mosaic,
    })
}

fn encode_base64_jpeg(image: &DynamicImage) -> Result<String, MosaicError> {
    let jpeg = encode_jpeg(image, JPEG_QUALITY)?;
    Ok(general_purpose::STANDARD.encode(jpeg))
}

pub fn render_results(outcome: &MosaicOutcome) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Photomosaic</title></head>
<body>
  <h2>Photomosaic</h2>
  <p>{width}x{height}, tile size {tile_size}, generated in {duration}</p>
  <div style="display:flex; gap:12px;">
    <img src="data:image/jpeg;base64,{original}" alt="original" style="max-width:48%;">
    <img src="data:image/jpeg;base64,{mosaic}" alt="mosaic" style="max-width:48%;">
  </div>
  <p><a href="/">Make another</a></p>
</body>
</html>
"#,
        width = outcome.width,
        height = outcome.height,
        tile_size = outcome.tile_size,
        duration = outcome.duration,
        original = outcome.original,
        mosaic = outcome.mosaic,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;
    use image::{ImageFormat, Rgba, RgbaImage};
    use photomosaic::{MemoryTileStore, PipelineConfig};
    use std::io::Cursor;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn state_with(count: u8) -> AppState {
        let mut store = MemoryTileStore::new();
        for i in 0..count {
            let shade = i.wrapping_mul(29);
            let tile = RgbaImage::from_pixel(4, 4, Rgba([shade, 255 - shade, shade / 3, 255]));
            store.insert(format!("{i:03}.png"), DynamicImage::ImageRgba8(tile));
        }
        let pipeline = MosaicPipeline::new(PipelineConfig::default().with_tile_size(2), Arc::new(store)).expect("pipeline");
        AppState::new(pipeline)
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x * 20) as u8, (y * 20) as u8, 90, 255])
        }));
        let mut buf = Vec::new();
        image.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png).expect("encode png");
        buf
    }

    fn upload(image: Option<Vec<u8>>, tile_size: Option<&str>) -> Upload {
        Upload {
            image: image.map(Bytes::from),
            tile_size: tile_size.map(str::to_string),
        }
    }

    #[test]
    fn status_codes() {
        assert_eq!(ServerError::MissingImage.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ServerError::TileSize("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ServerError::Mosaic(MosaicError::InvalidInput("empty".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServerError::Mosaic(MosaicError::TileIndexExhausted).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ServerError::Mosaic(MosaicError::Worker("panicked".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ServerError::MissingImage.into_response().status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn images_are_sent_at_full_jpeg_quality() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_fn(16, 16, |x, y| Rgba([(x * 16) as u8, (y * 16) as u8, 40, 255])));
        let sent = encode_base64_jpeg(&image).expect("encode");
        let best = encode_jpeg(&image, 100).expect("jpeg");
        assert_eq!(general_purpose::STANDARD.decode(sent).expect("base64"), best);
    }

    #[test]
    fn tile_size_parsing() {
        assert_eq!(parse_tile_size(None, 10).expect("default"), 10);
        assert_eq!(parse_tile_size(Some("  "), 10).expect("blank"), 10);
        assert_eq!(parse_tile_size(Some("25"), 10).expect("explicit"), 25);
        assert!(matches!(parse_tile_size(Some("0"), 10), Err(ServerError::TileSize(_))));
        assert!(matches!(parse_tile_size(Some("-3"), 10), Err(ServerError::TileSize(_))));
    }

    #[tokio::test]
    async fn process_returns_encoded_images() {
        let state = state_with(40);
        let outcome = process(&state, upload(Some(png_bytes(8, 6)), Some("2")))
            .await
            .expect("outcome");

        assert_eq!((outcome.width, outcome.height, outcome.tile_size), (8, 6, 2));
        let mosaic = general_purpose::STANDARD.decode(&outcome.mosaic).expect("base64");
        let decoded = image::load_from_memory(&mosaic).expect("jpeg");
        assert_eq!((decoded.width(), decoded.height()), (8, 6));
        assert_eq!(state.pipeline().tile_count(), 40);

        let page = render_results(&outcome);
        assert!(page.contains("data:image/jpeg;base64,"));
        assert!(page.contains(&outcome.duration));
    }

    #[tokio::test]
    async fn process_rejects_bad_uploads() {
        let state = state_with(4);
        let missing = process(&state, upload(None, Some("2"))).await;
        assert!(matches!(missing, Err(ServerError::MissingImage)));

        let garbage = process(&state, upload(Some(b"not an image".to_vec()), None)).await;
        assert!(matches!(garbage, Err(ServerError::Decode(_))));
    }

    #[tokio::test]
    async fn small_corpus_is_unprocessable() {
        // 8x8 at tile size 2 needs 16 tiles.
        let state = state_with(4);
        let err = process(&state, upload(Some(png_bytes(8, 8)), Some("2")))
            .await
            .expect_err("exhausted");
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    async fn send(app: Router, request: Vec<u8>) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });

        let mut stream = tokio::net::TcpStream::connect(addr).await.expect("connect");
        stream.write_all(&request).await.expect("write");
        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.expect("read");
        String::from_utf8_lossy(&response).into_owned()
    }

    #[tokio::test]
    async fn serves_health_and_form() {
        let health = send(
            router(state_with(1)),
            b"GET /healthz HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n".to_vec(),
        )
        .await;
        assert!(health.starts_with("HTTP/1.1 200"));
        assert!(health.ends_with("ok"));

        let form = send(
            router(state_with(1)),
            b"GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n".to_vec(),
        )
        .await;
        assert!(form.starts_with("HTTP/1.1 200"));
        assert!(form.contains("name=\"tile_size\""));
    }

    #[tokio::test]
    async fn api_accepts_multipart_uploads() {
        let mut body = Vec::new();
        body.extend_from_slice(b"--XBOUNDARY\r\nContent-Disposition: form-data; name=\"tile_size\"\r\n\r\n2\r\n");
        body.extend_from_slice(
            b"--XBOUNDARY\r\nContent-Disposition: form-data; name=\"image\"; filename=\"in.png\"\r\nContent-Type: image/png\r\n\r\n",
        );
        body.extend_from_slice(&png_bytes(4, 4));
        body.extend_from_slice(b"\r\n--XBOUNDARY--\r\n");

        let mut request = format!(
            "POST /api/mosaic HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\nContent-Type: multipart/form-data; boundary=XBOUNDARY\r\nContent-Length: {}\r\n\r\n",
            body.len()
        )
        .into_bytes();
        request.extend_from_slice(&body);

        let response = send(router(state_with(8)), request).await;
        assert!(response.starts_with("HTTP/1.1 200"), "{response}");
        assert!(response.contains("\"tile_size\":2"));
        assert!(response.contains("\"width\":4"));
    }
}
