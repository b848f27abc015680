use crate::projection::Projection;
use boxroom_camera::Camera;
use glam::{Mat4, Vec3};

/// Everything a renderer needs from the camera for one frame.
#[derive(Debug, Clone, Copy)]
pub struct RenderView {
    /// Camera position in world space.
    pub eye: Vec3,
    /// Unit view direction.
    pub forward: Vec3,
    pub view: Mat4,
    pub projection: Projection,
}

impl Default for RenderView {
    fn default() -> Self {
        Self::from_camera(&Camera::default(), Projection::default())
    }
}

impl RenderView {
    pub fn from_camera(camera: &Camera, projection: Projection) -> Self {
        Self {
            eye: camera.position,
            forward: camera.forward(),
            view: camera.view_matrix(),
            projection,
        }
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection.matrix() * self.view
    }

    /// Model-view-projection for one draw call.
    pub fn mvp(&self, model: Mat4) -> Mat4 {
        self.view_projection() * model
    }
}

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// A renderer only reads the view; camera state is owned by the controller.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame from the given view.
    fn render(&mut self, view: &RenderView) -> Self::Output;
}

/// Debug text renderer.
///
/// Produces a human-readable description of the frame. Useful for the CLI,
/// logging, and testing the render interface without a GPU.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    frames: u64,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&mut self, view: &RenderView) -> String {
        self.frames += 1;
        let mut out = String::new();
        out.push_str(&format!("=== Frame {} ===\n", self.frames));
        out.push_str(&format!(
            "Camera: eye=({:.2}, {:.2}, {:.2}) forward=({:.3}, {:.3}, {:.3})\n",
            view.eye.x, view.eye.y, view.eye.z, view.forward.x, view.forward.y, view.forward.z
        ));
        out.push_str(&format!(
            "Projection: fov={:.0} aspect={:.3} near={} far={}\n",
            view.projection.fov_y_degrees,
            view.projection.aspect,
            view.projection.near,
            view.projection.far
        ));

        let mvp = view.mvp(Mat4::IDENTITY);
        for row in 0..4 {
            let r = mvp.row(row);
            out.push_str(&format!(
                "  [{:>8.3} {:>8.3} {:>8.3} {:>8.3}]\n",
                r.x, r.y, r.z, r.w
            ));
        }

        out
    }
}
