use flowmap_distortion::{
    ContainerSize, EffectConfig, EffectController, EffectError, EffectState, FitVector, FlowField,
    FrameControl, ImageInfo, NormalizedPointer, RenderPipeline, Vec2,
};

#[derive(Default)]
struct RecordingFlow {
    mouse: Vec<NormalizedPointer>,
    velocity: Vec2,
    updates: usize,
}

impl FlowField for RecordingFlow {
    fn set_mouse(&mut self, pointer: NormalizedPointer) {
        self.mouse.push(pointer);
    }

    fn velocity(&self) -> Vec2 {
        self.velocity
    }

    fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    fn update(&mut self) {
        self.updates += 1;
    }
}

#[derive(Default)]
struct RecordingPipeline {
    sizes: Vec<(f64, f64)>,
    fits: Vec<FitVector>,
    /// Flow updates observed at each render.
    renders: Vec<usize>,
}

impl RenderPipeline for RecordingPipeline {
    type Flow = RecordingFlow;

    fn set_size(&mut self, width: f64, height: f64) -> (u32, u32) {
        self.sizes.push((width, height));
        (width as u32, height as u32)
    }

    fn set_fit(&mut self, fit: FitVector) {
        self.fits.push(fit);
    }

    fn render(&mut self, flow: &RecordingFlow) {
        self.renders.push(flow.updates);
    }
}

type Controller = EffectController<RecordingPipeline>;

const CONTAINER: ContainerSize = ContainerSize {
    width: 200.0,
    height: 100.0,
};

fn ready_controller() -> Controller {
    let mut controller = Controller::new(EffectConfig::default());
    controller.on_resize(CONTAINER.width, CONTAINER.height);
    let loaded = controller.on_image_loaded(
        ImageInfo {
            width: 100,
            height: 100,
        },
        RecordingPipeline::default(),
        RecordingFlow::default(),
    );
    assert!(loaded);
    controller
}

fn flow(controller: &Controller) -> &RecordingFlow {
    controller.flow().expect("stage built")
}

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-5
}

#[test]
fn loading_effect_does_not_draw() {
    let mut controller = Controller::new(EffectConfig::default());
    assert_eq!(controller.state(), EffectState::Loading);
    assert_eq!(controller.tick(), FrameControl::Stop);
    assert!(controller.flow().is_none());
    assert_eq!(controller.fit(), None);
}

#[test]
fn image_load_fits_to_the_container() {
    let controller = ready_controller();
    assert_eq!(controller.state(), EffectState::Ready);

    let fit = controller.fit().expect("fit after load");
    assert_eq!(fit.draw_width, 200);
    assert_eq!(fit.draw_height, 100);
    assert_eq!((fit.scale_x, fit.scale_y), (1.0, 0.5));

    let pipeline = controller.pipeline().unwrap();
    assert_eq!(pipeline.sizes, vec![(200.0, 100.0)]);
    assert_eq!(pipeline.fits, vec![fit]);
}

#[test]
fn first_tick_starts_running_and_renders_after_update() {
    let mut controller = ready_controller();
    assert_eq!(controller.tick(), FrameControl::Continue);
    assert_eq!(controller.state(), EffectState::Running);
    assert_eq!(controller.tick(), FrameControl::Continue);

    // Each render sees the flow already advanced for that frame.
    assert_eq!(controller.pipeline().unwrap().renders, vec![1, 2]);
    assert_eq!(flow(&controller).updates, 2);
}

#[test]
fn resize_recomputes_fit() {
    let mut controller = ready_controller();
    assert!(controller.on_resize(100.0, 200.0));

    let fit = controller.fit().unwrap();
    assert_eq!((fit.draw_width, fit.draw_height), (100, 200));
    assert_eq!((fit.scale_x, fit.scale_y), (0.5, 1.0));
}

#[test]
fn degenerate_resize_keeps_previous_fit() {
    let mut controller = ready_controller();
    let before = controller.fit();

    assert!(!controller.on_resize(0.0, 100.0));
    assert!(!controller.on_resize(200.0, 0.0));
    assert!(!controller.on_resize(f64::NAN, 100.0));

    assert_eq!(controller.fit(), before);
    assert_eq!(controller.pipeline().unwrap().sizes.len(), 1);
}

#[test]
fn pointer_motion_feeds_the_flow_field() {
    let mut controller = ready_controller();
    controller.on_pointer_move(0.0, 0.0, CONTAINER, 1_000.0);
    controller.on_pointer_move(10.0, 0.0, CONTAINER, 1_010.0);
    controller.tick();

    let target = controller.target_velocity();
    assert!(approx(target.x, 10.0 / 10.4), "target={target:?}");
    assert_eq!(target.y, 0.0);
    assert_eq!(
        controller.pointer(),
        NormalizedPointer::from_container(10.0, 0.0, 200.0, 100.0)
    );
    assert_eq!(controller.pointer().as_vec2(), Vec2::new(0.05, 1.0));

    // Attack: the field moves 15% of the way towards the target.
    let flow = flow(&controller);
    assert!(approx(flow.velocity.x, 0.15 * 10.0 / 10.4));
    assert_eq!(flow.mouse.last(), Some(&controller.pointer()));
}

#[test]
fn idle_frame_releases_the_trail() {
    let mut controller = ready_controller();
    controller.on_pointer_move(0.0, 0.0, CONTAINER, 0.0);
    controller.on_pointer_move(10.0, 0.0, CONTAINER, 10.0);
    controller.tick();
    let after_motion = flow(&controller).velocity;

    controller.tick();
    assert_eq!(controller.pointer(), NormalizedPointer::INACTIVE);
    assert_eq!(controller.target_velocity(), Vec2::ZERO);

    // Release: 10% of the way back to zero, not a snap.
    let released = flow(&controller).velocity;
    assert!(approx(released.x, after_motion.x * 0.9));
    assert_eq!(flow(&controller).mouse.last(), Some(&NormalizedPointer::INACTIVE));
}

#[test]
fn idle_decay_is_idempotent() {
    let mut controller = ready_controller();
    controller.on_pointer_move(50.0, 50.0, CONTAINER, 0.0);
    controller.tick();

    controller.tick();
    let first = (controller.pointer(), controller.target_velocity());
    controller.tick();
    let second = (controller.pointer(), controller.target_velocity());

    assert_eq!(first, (NormalizedPointer::INACTIVE, Vec2::ZERO));
    assert_eq!(first, second);
}

#[test]
fn pointer_before_ready_is_ignored() {
    let mut controller = Controller::new(EffectConfig::default());
    controller.on_pointer_move(20.0, 20.0, CONTAINER, 0.0);
    assert_eq!(controller.pointer(), NormalizedPointer::INACTIVE);

    let mut controller = ready_controller();
    controller.on_pointer_move(20.0, 20.0, ContainerSize::new(0.0, 0.0), 0.0);
    assert_eq!(controller.pointer(), NormalizedPointer::INACTIVE);
}

#[test]
fn decode_failure_is_terminal() {
    let mut controller = Controller::new(EffectConfig::default());
    controller.fail(&EffectError::ImageDecode {
        src: "missing.jpg".into(),
    });
    assert_eq!(controller.state(), EffectState::Failed);

    let loaded = controller.on_image_loaded(
        ImageInfo {
            width: 10,
            height: 10,
        },
        RecordingPipeline::default(),
        RecordingFlow::default(),
    );
    assert!(!loaded);
    assert!(controller.flow().is_none());
    assert_eq!(controller.tick(), FrameControl::Stop);
    assert!(!controller.on_resize(200.0, 100.0));
}

#[test]
fn disposed_effect_ignores_callbacks() {
    let mut controller = ready_controller();
    controller.tick();
    let fit = controller.fit();

    assert!(controller.dispose());
    assert_eq!(controller.state(), EffectState::Disposed);
    assert!(controller.flow().is_none());

    assert!(!controller.on_resize(640.0, 480.0));
    controller.on_pointer_move(10.0, 10.0, CONTAINER, 16.0);
    controller.on_pointer_move(30.0, 10.0, CONTAINER, 32.0);
    assert_eq!(controller.tick(), FrameControl::Stop);

    assert_eq!(controller.fit(), fit);
    assert_eq!(controller.pointer(), NormalizedPointer::INACTIVE);
    assert_eq!(controller.target_velocity(), Vec2::ZERO);
    assert_eq!(controller.state(), EffectState::Disposed);

    assert!(!controller.dispose());
}

#[test]
fn unknown_image_aspect_falls_back_to_square() {
    let mut controller = Controller::new(EffectConfig::default());
    controller.on_image_loaded(
        ImageInfo {
            width: 0,
            height: 0,
        },
        RecordingPipeline::default(),
        RecordingFlow::default(),
    );
    assert!(controller.on_resize(200.0, 100.0));
    let fit = controller.fit().unwrap();
    assert_eq!((fit.scale_x, fit.scale_y), (1.0, 0.5));
}
