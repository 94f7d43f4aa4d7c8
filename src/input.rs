/// Which pointer stream an effect listens to. Chosen once when listeners are
/// attached, never per event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputSource {
    Mouse,
    Touch,
}

impl InputSource {
    pub fn from_touch_support(touch: bool) -> Self {
        if touch {
            InputSource::Touch
        } else {
            InputSource::Mouse
        }
    }

    pub fn event_name(self) -> &'static str {
        match self {
            InputSource::Mouse => "mousemove",
            InputSource::Touch => "touchmove",
        }
    }
}
