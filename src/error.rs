use thiserror::Error;

#[derive(Debug, Error)]
pub enum EffectError {
    #[error("WebGL2 not supported")]
    WebGlUnavailable,
    #[error("failed to compile {stage} shader: {log}")]
    ShaderCompile { stage: &'static str, log: String },
    #[error("failed to link program: {0}")]
    ProgramLink(String),
    #[error("failed to allocate {0}")]
    Allocation(&'static str),
    #[error("uniform `{0}` not found in program")]
    MissingUniform(&'static str),
    #[error("{0} not found")]
    MissingElement(&'static str),
    #[error("failed to decode image `{src}`")]
    ImageDecode { src: String },
    #[error("invalid value `{value}` for `{key}`")]
    InvalidSetting { key: String, value: String },
    #[error("javascript error: {0}")]
    Js(String),
}

#[cfg(target_arch = "wasm32")]
impl From<wasm_bindgen::JsValue> for EffectError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        EffectError::Js(format!("{value:?}"))
    }
}

#[cfg(target_arch = "wasm32")]
impl From<EffectError> for wasm_bindgen::JsValue {
    fn from(err: EffectError) -> Self {
        js_sys::Error::new(&err.to_string()).into()
    }
}
