use glam::{Mat4, Vec3, Vec4};
use skyroom::camera3d::Camera3D;
use skyroom::canvas::SkyCanvas;
use skyroom::mesh::TriMesh;
use skyroom::outline::OutlineStyle;
use skyroom::renderer::passes::{FramePass, WINDOW_STENCIL_REF};
use skyroom::renderer::software::{SoftwareFrame, SoftwareInputs};
use skyroom::renderer::{DrawItem, FrameDrawList, SceneLighting};
use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;

const SIZE: u32 = 400;
const RED: [u8; 4] = [255, 0, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];

fn camera() -> Camera3D {
    Camera3D::new(Vec3::new(0.0, 0.0, 2.0), Vec3::ZERO, FRAC_PI_2, 0.1, 10.0)
}

fn red_sky() -> SkyCanvas {
    let mut sky = SkyCanvas::new(8, 8);
    sky.fill_vertical_gradient(Vec3::X, Vec3::X);
    sky
}

fn pane() -> DrawItem {
    DrawItem { mesh: Arc::new(TriMesh::quad(1.0, 1.0)), model: Mat4::IDENTITY, color: Vec4::new(0.0, 1.0, 0.0, 1.0) }
}

fn render(draws: &FrameDrawList, sky: &SkyCanvas, outline: OutlineStyle) -> SoftwareFrame {
    let cam = camera();
    let mut frame = SoftwareFrame::new(SIZE, SIZE);
    frame.render(&SoftwareInputs {
        draws,
        view: cam.view_matrix(),
        proj: cam.projection_matrix(1.0),
        sky,
        clear_color: [0.0, 0.0, 1.0],
        lighting: SceneLighting::default(),
        outline,
    });
    frame
}

#[test]
fn sky_shows_only_through_window_panes() {
    let draws = FrameDrawList { scene: vec![pane()], windows: vec![pane()], outlines: Vec::new() };
    let frame = render(&draws, &red_sky(), OutlineStyle::default());

    for (x, y) in [(200, 200), (160, 160), (240, 240)] {
        assert_eq!(frame.pixel(x, y), RED, "pane pixel ({x},{y})");
        assert_eq!(u32::from(frame.stencil(x, y)), WINDOW_STENCIL_REF);
    }
    for (x, y) in [(100, 100), (300, 200), (200, 20), (5, 395)] {
        assert_eq!(frame.pixel(x, y), BLUE, "background pixel ({x},{y})");
        assert_eq!(frame.stencil(x, y), 0);
    }
}

#[test]
fn window_composite_is_an_exact_square() {
    let draws = FrameDrawList { scene: vec![pane()], windows: vec![pane()], outlines: Vec::new() };
    let frame = render(&draws, &red_sky(), OutlineStyle::default());

    let (mut red, mut blue) = (0, 0);
    for y in 0..SIZE {
        for x in 0..SIZE {
            match frame.pixel(x, y) {
                RED => {
                    assert!((150..250).contains(&x) && (150..250).contains(&y), "red outside the pane at ({x},{y})");
                    red += 1;
                }
                BLUE => blue += 1,
                other => panic!("unexpected color {other:?} at ({x},{y})"),
            }
        }
    }
    assert_eq!(red, 100 * 100);
    assert_eq!(blue, SIZE * SIZE - 100 * 100);
}

#[test]
fn pane_without_mask_keeps_scene_color() {
    let draws = FrameDrawList { scene: vec![pane()], windows: Vec::new(), outlines: Vec::new() };
    let frame = render(&draws, &red_sky(), OutlineStyle::default());
    let px = frame.pixel(200, 200);
    assert_eq!(px[0], 0);
    assert!(px[1] > 100);
    assert_eq!(frame.stencil(200, 200), 0);
}

#[test]
fn occluder_in_front_of_window_blocks_the_sky() {
    let blocker = DrawItem {
        mesh: Arc::new(TriMesh::cuboid(Vec3::splat(0.2))),
        model: Mat4::from_translation(Vec3::new(0.0, 0.0, 0.5)),
        color: Vec4::new(1.0, 1.0, 1.0, 1.0),
    };
    let draws = FrameDrawList { scene: vec![pane(), blocker], windows: vec![pane()], outlines: Vec::new() };
    let frame = render(&draws, &red_sky(), OutlineStyle::default());
    assert_ne!(frame.pixel(200, 200), RED);
    assert_eq!(frame.stencil(200, 200), 0);
    assert_eq!(frame.pixel(160, 200), RED);
}

#[test]
fn mask_pass_writes_no_color_or_depth() {
    let draws = FrameDrawList { scene: Vec::new(), windows: vec![pane()], outlines: Vec::new() };
    let sky = red_sky();
    let cam = camera();
    let inputs = SoftwareInputs {
        draws: &draws,
        view: cam.view_matrix(),
        proj: cam.projection_matrix(1.0),
        sky: &sky,
        clear_color: [0.0, 0.0, 1.0],
        lighting: SceneLighting::default(),
        outline: OutlineStyle::default(),
    };
    let mut frame = SoftwareFrame::new(SIZE, SIZE);
    frame.run_pass(FramePass::Clear, &inputs);
    frame.run_pass(FramePass::WindowMask, &inputs);
    assert_eq!(frame.pixel(200, 200), BLUE);
    assert_eq!(frame.depth(200, 200), 1.0);
    assert_eq!(u32::from(frame.stencil(200, 200)), WINDOW_STENCIL_REF);
}

#[test]
fn outline_rim_surrounds_hovered_mesh() {
    let block = DrawItem {
        mesh: Arc::new(TriMesh::cuboid(Vec3::splat(0.5))),
        model: Mat4::IDENTITY,
        color: Vec4::new(0.8, 0.2, 0.2, 1.0),
    };
    let draws = FrameDrawList { scene: vec![block.clone()], windows: Vec::new(), outlines: vec![block] };
    let outline = OutlineStyle { thickness: 0.05, color: Vec4::ONE };
    let frame = render(&draws, &red_sky(), outline);

    assert_eq!(frame.pixel(231, 200), [255, 255, 255, 255]);
    let center = frame.pixel(200, 200);
    assert_ne!(center, [255, 255, 255, 255]);
    assert!(center[0] > center[1]);
    assert_eq!(frame.pixel(240, 200), BLUE);
}
