use crate::draw::assets::{decode_image_bytes, AssetError, LoadedImage};
use crate::draw::compile::{CompileError, InlineData, RequestPayload};
use std::fmt;

/// Looks at an assembled request before it leaves the process and decides whether to send it.
pub trait PayloadInspector {
    fn approve(&mut self, payload: &RequestPayload) -> bool;
}

/// Sends an approved request to the image-generation service.
pub trait GenerationClient {
    fn generate(
        &mut self,
        payload: &RequestPayload,
    ) -> Result<GenerationResponse, GenerationError>;
}

/// Inspector that approves everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproveAll;

impl PayloadInspector for ApproveAll {
    fn approve(&mut self, _payload: &RequestPayload) -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GenerationResponse {
    pub image: Option<InlineData>,
    pub message: Option<String>,
}

#[derive(Debug)]
pub enum GenerationError {
    Compile(CompileError),
    /// The inspector declined to send the request.
    Declined,
    /// The service answered but refused the request.
    Rejected(String),
    Transport(String),
    InvalidImage(AssetError),
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationError::Compile(err) => write!(f, "could not build request: {err}"),
            GenerationError::Declined => f.write_str("request was not approved for sending"),
            GenerationError::Rejected(reason) => write!(f, "generation rejected: {reason}"),
            GenerationError::Transport(reason) => write!(f, "generation request failed: {reason}"),
            GenerationError::InvalidImage(err) => write!(f, "generated image is unusable: {err}"),
        }
    }
}

impl From<CompileError> for GenerationError {
    fn from(err: CompileError) -> Self {
        GenerationError::Compile(err)
    }
}

impl std::error::Error for GenerationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GenerationError::Compile(err) => Some(err),
            GenerationError::InvalidImage(err) => Some(err),
            _ => None,
        }
    }
}

/// Decode the image carried by a response, if any.
pub fn decode_response_image(
    response: &GenerationResponse,
) -> Result<Option<LoadedImage>, GenerationError> {
    let Some(data) = response.image.as_ref() else {
        return Ok(None);
    };
    let bytes = data.decode().map_err(|err| {
        GenerationError::InvalidImage(AssetError::InvalidDataUrl(err.to_string()))
    })?;
    decode_image_bytes("generation result", &bytes)
        .map(Some)
        .map_err(GenerationError::InvalidImage)
}

/// Ask `inspector`, then `client`. Nothing is sent when the inspector declines.
pub fn run_generation(
    payload: &RequestPayload,
    inspector: &mut dyn PayloadInspector,
    client: &mut dyn GenerationClient,
) -> Result<GenerationResponse, GenerationError> {
    if !inspector.approve(payload) {
        tracing::info!("generation request declined by inspector");
        return Err(GenerationError::Declined);
    }
    match client.generate(payload) {
        Ok(response) => {
            tracing::info!(
                has_image = response.image.is_some(),
                "generation request completed"
            );
            Ok(response)
        }
        Err(err) => {
            tracing::warn!(error = %err, "generation request failed");
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::assets::encode_png;
    use crate::draw::compile::{GenerationConfig, OutputResolution, Part};
    use image::{Rgba, RgbaImage};

    struct Recording {
        calls: usize,
        response: Option<GenerationResponse>,
    }

    impl GenerationClient for Recording {
        fn generate(
            &mut self,
            _payload: &RequestPayload,
        ) -> Result<GenerationResponse, GenerationError> {
            self.calls += 1;
            self.response
                .clone()
                .ok_or_else(|| GenerationError::Rejected("quota".into()))
        }
    }

    struct Decline;

    impl PayloadInspector for Decline {
        fn approve(&mut self, _payload: &RequestPayload) -> bool {
            false
        }
    }

    fn payload() -> RequestPayload {
        RequestPayload {
            parts: vec![Part::Text("IMG_1 is the base render to edit.".into())],
            config: GenerationConfig {
                creative_freedom: 10,
                image_size: OutputResolution::OneK,
            },
        }
    }

    #[test]
    fn declined_requests_never_reach_the_client() {
        let mut client = Recording {
            calls: 0,
            response: Some(GenerationResponse::default()),
        };
        let result = run_generation(&payload(), &mut Decline, &mut client);
        assert!(matches!(result, Err(GenerationError::Declined)));
        assert_eq!(client.calls, 0);
    }

    #[test]
    fn rejection_is_passed_through() {
        let mut client = Recording {
            calls: 0,
            response: None,
        };
        let err = run_generation(&payload(), &mut ApproveAll, &mut client)
            .expect_err("rejected");
        assert!(matches!(err, GenerationError::Rejected(ref reason) if reason == "quota"));
        assert_eq!(client.calls, 1);
    }

    #[test]
    fn response_image_decodes_to_pixels() {
        let image = RgbaImage::from_pixel(2, 3, Rgba([1, 2, 3, 255]));
        let response = GenerationResponse {
            image: Some(InlineData::png(&encode_png(&image).expect("png"))),
            message: None,
        };
        let decoded = decode_response_image(&response)
            .expect("decode")
            .expect("image");
        assert_eq!(decoded.pixels, image);

        let broken = GenerationResponse {
            image: Some(InlineData {
                mime_type: "image/png".into(),
                data: "not base64!".into(),
            }),
            message: None,
        };
        assert!(matches!(
            decode_response_image(&broken),
            Err(GenerationError::InvalidImage(_))
        ));
    }
}
