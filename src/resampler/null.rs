use super::{
    ResampleRequest, Resampler, ResamplerDescriptor, ResamplerQuality, RESAMPLER_API_VERSION,
};
use crate::core::config::FilterConfig;
use crate::core::error::Error;
use crate::core::simd::SimdCaps;
use alloc::boxed::Box;

/// A resampler that does nothing.
///
/// Selected when input and output rates coincide. `process` reports zero
/// frames consumed and produced; the pipeline sees
/// [`is_passthrough`](Resampler::is_passthrough) and forwards input itself.
pub struct NullResampler;

impl Resampler for NullResampler {
    fn process(&mut self, request: &mut ResampleRequest<'_>) {
        request.frames_consumed = 0;
        request.frames_produced = 0;
    }

    fn reset(&mut self) {}

    fn ident(&self) -> &str {
        "null"
    }

    fn is_passthrough(&self) -> bool {
        true
    }
}

fn init(
    _config: &FilterConfig,
    _bandwidth_mod: f64,
    _quality: ResamplerQuality,
    _caps: SimdCaps,
) -> Result<Box<dyn Resampler>, Error> {
    Ok(Box::new(NullResampler))
}

pub const DESCRIPTOR: ResamplerDescriptor = ResamplerDescriptor {
    ident: "null",
    api_version: RESAMPLER_API_VERSION,
    accel: SimdCaps::empty(),
    init,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_is_noop() {
        let mut resampler = (DESCRIPTOR.init)(
            &FilterConfig::new(),
            1.0,
            ResamplerQuality::Normal,
            SimdCaps::empty(),
        )
        .unwrap();

        let input = [0.5f32; 8];
        let mut output = [9.0f32; 8];
        let mut req = ResampleRequest::new(&input, &mut output, 1.0);
        resampler.process(&mut req);

        assert_eq!(req.frames_consumed, 0);
        assert_eq!(req.frames_produced, 0);
        assert_eq!(output, [9.0; 8]);
        assert!(resampler.is_passthrough());
    }
}
