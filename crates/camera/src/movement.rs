use crate::camera::Camera;
use boxroom_input::{Action, InputSnapshot};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// How keyboard input translates the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum MovementPolicy {
    /// Move along the 3D view direction; ascend and descend are vertical.
    /// No gravity, no floor.
    FreeFly,
    /// Walk on the horizontal plane with gravity, jumping and a floor clamp.
    #[default]
    Grounded,
}

/// Movement tunables. Missing fields deserialize to their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    pub policy: MovementPolicy,
    /// Degrees per mouse unit.
    pub mouse_sensitivity: f32,
    /// World units per second.
    pub move_speed: f32,
    /// World units per second squared.
    pub gravity: f32,
    /// Vertical velocity imparted by a jump.
    pub jump_speed: f32,
    /// Lowest allowed eye height in the grounded policy.
    pub floor_height: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            policy: MovementPolicy::Grounded,
            mouse_sensitivity: 0.1,
            move_speed: 5.0,
            gravity: 9.8,
            jump_speed: 5.0,
            floor_height: 1.0,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reading config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl MovementConfig {
    pub fn with_policy(mut self, policy: MovementPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Read a JSON config. Fields missing from the file keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_reader(BufReader::new(file)).map_err(|source| {
            ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })?;
        tracing::debug!(path = %path.display(), "loaded movement config");
        Ok(config)
    }

    /// [`MovementConfig::load`] when a path is given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

/// Owns the camera and advances it once per frame.
#[derive(Debug, Clone, Default)]
pub struct CameraController {
    pub camera: Camera,
    config: MovementConfig,
}

impl CameraController {
    pub fn new(camera: Camera, config: MovementConfig) -> Self {
        let mut controller = Self { camera, config };
        controller.enter_policy();
        controller
    }

    pub fn policy(&self) -> MovementPolicy {
        self.config.policy
    }

    /// Switch policy between frames.
    pub fn set_policy(&mut self, policy: MovementPolicy) {
        if self.config.policy != policy {
            tracing::debug!(?policy, "movement policy changed");
            self.config.policy = policy;
            self.enter_policy();
        }
    }

    fn enter_policy(&mut self) {
        match self.config.policy {
            MovementPolicy::FreeFly => {
                self.camera.vertical_velocity = 0.0;
                self.camera.grounded = false;
            }
            MovementPolicy::Grounded => {
                // Contact is re-established by the next update's floor check.
                self.camera.grounded = self.camera.position.y <= self.config.floor_height;
            }
        }
    }

    /// Advance one frame: mouse look first, then translation.
    pub fn update(&mut self, input: &InputSnapshot) {
        let cfg = self.config;
        let delta = input.mouse_delta.as_vec2();
        self.camera.look(delta.x, delta.y, cfg.mouse_sensitivity);

        let dt = input.elapsed_seconds;
        match cfg.policy {
            MovementPolicy::FreeFly => fly(&mut self.camera, input, &cfg, dt),
            MovementPolicy::Grounded => walk(&mut self.camera, input, &cfg, dt),
        }
    }
}

fn axis(input: &InputSnapshot, positive: Action, negative: Action) -> f32 {
    match (input.is_down(positive), input.is_down(negative)) {
        (true, false) => 1.0,
        (false, true) => -1.0,
        _ => 0.0,
    }
}

fn fly(cam: &mut Camera, input: &InputSnapshot, cfg: &MovementConfig, dt: f32) {
    let step = cfg.move_speed * dt;
    let front = cam.forward();
    let right = cam.right();

    cam.position += front * axis(input, Action::Forward, Action::Back) * step;
    cam.position += right * axis(input, Action::Right, Action::Left) * step;
    // Ascend and descend ignore pitch.
    cam.position += Vec3::Y * axis(input, Action::JumpOrUp, Action::CrouchOrDown) * step;
}

fn walk(cam: &mut Camera, input: &InputSnapshot, cfg: &MovementConfig, dt: f32) {
    let front = cam.forward_flat();
    let right = front.cross(Vec3::Y).normalize();

    let wish = front * axis(input, Action::Forward, Action::Back)
        + right * axis(input, Action::Right, Action::Left);
    if wish.length_squared() > 0.0 {
        cam.position += wish.normalize() * cfg.move_speed * dt;
    }

    if input.is_down(Action::JumpOrUp) && cam.grounded {
        tracing::trace!(speed = cfg.jump_speed, "jump");
        cam.vertical_velocity = cfg.jump_speed;
        cam.grounded = false;
    }

    cam.vertical_velocity -= cfg.gravity * dt;
    cam.position.y += cam.vertical_velocity * dt;

    let floor = cfg.floor_height;
    let resting = cam.position.y <= floor && cam.vertical_velocity <= 0.0;
    if cam.position.y < floor || resting {
        if !cam.grounded {
            tracing::trace!(y = cam.position.y, "landed");
        }
        cam.position.y = floor;
        cam.vertical_velocity = 0.0;
        cam.grounded = true;
    } else {
        cam.grounded = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    const EPS: f32 = 1e-4;

    fn grounded() -> CameraController {
        CameraController::new(Camera::default(), MovementConfig::default())
    }

    fn free_fly() -> CameraController {
        CameraController::new(
            Camera::new(Vec3::new(0.0, 3.0, 0.0)),
            MovementConfig::default().with_policy(MovementPolicy::FreeFly),
        )
    }

    fn horizontal(v: Vec3) -> Vec2 {
        Vec2::new(v.x, v.z)
    }

    #[test]
    fn config_defaults() {
        let cfg = MovementConfig::default();
        assert_eq!(cfg.policy, MovementPolicy::Grounded);
        assert_eq!(cfg.mouse_sensitivity, 0.1);
        assert_eq!(cfg.move_speed, 5.0);
        assert_eq!(cfg.gravity, 9.8);
        assert_eq!(cfg.jump_speed, 5.0);
        assert_eq!(cfg.floor_height, 1.0);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let cfg: MovementConfig =
            serde_json::from_str(r#"{ "policy": "free_fly", "move_speed": 8.0 }"#).unwrap();
        assert_eq!(cfg.policy, MovementPolicy::FreeFly);
        assert_eq!(cfg.move_speed, 8.0);
        assert_eq!(cfg.gravity, 9.8);
        assert_eq!(cfg.floor_height, 1.0);
    }

    #[test]
    fn config_file_overrides_only_given_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("movement.json");
        std::fs::write(&path, r#"{ "gravity": 3.5 }"#).unwrap();
        let cfg = MovementConfig::load(&path).unwrap();
        assert_eq!(cfg.gravity, 3.5);
        assert_eq!(cfg.policy, MovementPolicy::Grounded);
        assert_eq!(cfg.move_speed, 5.0);
    }

    #[test]
    fn missing_config_path_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = MovementConfig::load(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().starts_with("reading config"));
    }

    #[test]
    fn malformed_config_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ policy: ").unwrap();
        assert!(matches!(
            MovementConfig::load(&path).unwrap_err(),
            ConfigError::Parse { .. }
        ));
    }

    #[test]
    fn no_config_path_means_defaults() {
        assert_eq!(
            MovementConfig::load_or_default(None).unwrap(),
            MovementConfig::default()
        );
    }

    #[test]
    fn forward_at_yaw_minus_90_moves_negative_z() {
        let mut ctl = grounded();
        let start = ctl.camera.position;
        ctl.update(&InputSnapshot::new(1.0).with_action(Action::Forward));
        let moved = ctl.camera.position - start;
        assert!((moved - Vec3::new(0.0, 0.0, -5.0)).length() < EPS, "moved {moved}");
    }

    #[test]
    fn free_fly_forward_matches_grounded_when_level() {
        let mut ctl = free_fly();
        let start = ctl.camera.position;
        ctl.update(&InputSnapshot::new(1.0).with_action(Action::Forward));
        let moved = ctl.camera.position - start;
        assert!((moved - Vec3::new(0.0, 0.0, -5.0)).length() < EPS, "moved {moved}");
    }

    #[test]
    fn mouse_delta_turns_before_moving() {
        let mut ctl = grounded();
        ctl.update(&InputSnapshot::new(0.0).with_mouse(100, 0));
        assert_eq!(ctl.camera.yaw, -80.0);
        assert_eq!(ctl.camera.pitch, 0.0);
    }

    #[test]
    fn pitch_stays_clamped_under_update() {
        let mut ctl = free_fly();
        for dy in [-30_000, 12, 45_000, -7, 1_000_000, -1_000_000] {
            ctl.update(&InputSnapshot::new(0.016).with_mouse(0, dy));
            assert!((-89.0..=89.0).contains(&ctl.camera.pitch));
        }
    }

    #[test]
    fn diagonal_is_not_faster() {
        let dt = 0.25;
        let mut straight = grounded();
        straight.camera.yaw = 31.0;
        let start = straight.camera.position;
        straight.update(&InputSnapshot::new(dt).with_action(Action::Forward));
        let straight_dist = horizontal(straight.camera.position - start).length();

        let mut diagonal = grounded();
        diagonal.camera.yaw = 31.0;
        diagonal.update(
            &InputSnapshot::new(dt)
                .with_action(Action::Forward)
                .with_action(Action::Right),
        );
        let diagonal_dist = horizontal(diagonal.camera.position - start).length();

        assert!((straight_dist - 5.0 * dt).abs() < EPS);
        assert!((diagonal_dist - straight_dist).abs() < EPS);
    }

    #[test]
    fn looking_up_does_not_slow_walking() {
        let mut ctl = grounded();
        ctl.camera.pitch = 80.0;
        let start = ctl.camera.position;
        ctl.update(&InputSnapshot::new(0.5).with_action(Action::Forward));
        let moved = ctl.camera.position - start;
        assert!((horizontal(moved).length() - 2.5).abs() < EPS);
        assert_eq!(ctl.camera.position.y, 1.0);
    }

    #[test]
    fn opposing_keys_cancel() {
        let mut ctl = grounded();
        let start = ctl.camera.position;
        ctl.update(
            &InputSnapshot::new(0.5)
                .with_action(Action::Left)
                .with_action(Action::Right),
        );
        assert_eq!(ctl.camera.position, start);
    }

    #[test]
    fn strafe_right_is_to_the_right() {
        let mut ctl = grounded();
        ctl.update(&InputSnapshot::new(1.0).with_action(Action::Right));
        // Facing -Z, right is +X.
        assert!((ctl.camera.position.x - 5.0).abs() < EPS);
    }

    #[test]
    fn jump_from_ground_sets_exact_velocity() {
        let mut ctl = grounded();
        assert!(ctl.camera.grounded);
        ctl.update(&InputSnapshot::new(0.0).with_action(Action::JumpOrUp));
        assert_eq!(ctl.camera.vertical_velocity, 5.0);
        assert!(!ctl.camera.grounded);
    }

    #[test]
    fn jump_frame_also_applies_gravity() {
        let mut ctl = grounded();
        ctl.update(&InputSnapshot::new(0.1).with_action(Action::JumpOrUp));
        assert!((ctl.camera.vertical_velocity - (5.0 - 0.98)).abs() < EPS);
        assert!(ctl.camera.position.y > 1.0);
        assert!(!ctl.camera.grounded);
    }

    #[test]
    fn jump_while_airborne_is_ignored() {
        let mut with_jump = grounded();
        with_jump.camera.position.y = 3.0;
        with_jump.camera.grounded = false;
        let mut without = with_jump.clone();

        with_jump.update(&InputSnapshot::new(0.05).with_action(Action::JumpOrUp));
        without.update(&InputSnapshot::new(0.05));

        assert_eq!(with_jump.camera, without.camera);
        assert!(with_jump.camera.vertical_velocity < 0.0);
    }

    #[test]
    fn resting_on_floor_stays_grounded() {
        let mut ctl = grounded();
        for dt in [0.0, 0.016, 0.1, 0.0] {
            ctl.update(&InputSnapshot::new(dt));
            assert!(ctl.camera.grounded);
            assert_eq!(ctl.camera.position.y, 1.0);
            assert_eq!(ctl.camera.vertical_velocity, 0.0);
        }
    }

    #[test]
    fn jump_arc_lands_back_on_floor() {
        let mut ctl = grounded();
        let jump = InputSnapshot::new(1.0 / 60.0).with_action(Action::JumpOrUp);
        let idle = InputSnapshot::new(1.0 / 60.0);
        ctl.update(&jump);

        let mut peak = 0.0_f32;
        let mut frames = 1;
        while !ctl.camera.grounded {
            ctl.update(&idle);
            peak = peak.max(ctl.camera.position.y);
            frames += 1;
            assert!(frames < 600, "never landed");
        }
        // v^2 / 2g above the floor, give or take discretisation.
        assert!((peak - (1.0 + 25.0 / 19.6)).abs() < 0.1, "peak {peak}");
        // Flight time is about 2v/g.
        let seconds = frames as f32 / 60.0;
        assert!((seconds - 10.0 / 9.8).abs() < 0.05, "flight {seconds}");
        assert_eq!(ctl.camera.position.y, 1.0);
    }

    #[test]
    fn floor_holds_for_any_update_sequence() {
        let mut ctl = grounded();
        let pattern = [
            (0.016, vec![Action::JumpOrUp, Action::Forward]),
            (0.1, vec![Action::CrouchOrDown]),
            (0.5, vec![]),
            (0.0, vec![Action::JumpOrUp]),
            (0.033, vec![Action::Left, Action::Back]),
            (2.0, vec![Action::JumpOrUp]),
            (0.007, vec![]),
        ];
        for i in 0..500 {
            let (dt, actions) = &pattern[i % pattern.len()];
            let wiggle = i as i32;
            let mut snap = InputSnapshot::new(*dt).with_mouse(wiggle % 13 - 6, wiggle % 7 - 3);
            for a in actions {
                snap = snap.with_action(*a);
            }
            ctl.update(&snap);
            assert!(ctl.camera.position.y >= 1.0, "frame {i}: y={}", ctl.camera.position.y);
        }
    }

    #[test]
    fn crouch_does_nothing_when_grounded() {
        let mut ctl = grounded();
        let before = ctl.camera;
        ctl.update(&InputSnapshot::new(0.2).with_action(Action::CrouchOrDown));
        assert_eq!(ctl.camera, before);
    }

    #[test]
    fn free_fly_ascend_and_descend_cancel() {
        let mut ctl = free_fly();
        ctl.camera.pitch = 35.0;
        let start = ctl.camera.position;
        ctl.update(
            &InputSnapshot::new(0.5)
                .with_action(Action::JumpOrUp)
                .with_action(Action::CrouchOrDown),
        );
        assert_eq!(ctl.camera.position, start);
    }

    #[test]
    fn free_fly_ascend_moves_up_when_level() {
        let mut ctl = free_fly();
        let start = ctl.camera.position;
        ctl.update(&InputSnapshot::new(1.0).with_action(Action::JumpOrUp));
        assert!((ctl.camera.position - start - Vec3::new(0.0, 5.0, 0.0)).length() < EPS);
    }

    #[test]
    fn free_fly_ascend_is_vertical_at_any_pitch() {
        for pitch in [60.0, -60.0, 89.0] {
            let mut ctl = free_fly();
            ctl.camera.pitch = pitch;
            let start = ctl.camera.position;
            ctl.update(&InputSnapshot::new(1.0).with_action(Action::JumpOrUp));
            let moved = ctl.camera.position - start;
            assert!(horizontal(moved).length() < EPS, "pitch {pitch}: {moved}");
            assert!((moved.y - 5.0).abs() < EPS);

            ctl.update(&InputSnapshot::new(1.0).with_action(Action::CrouchOrDown));
            assert!((ctl.camera.position - start).length() < EPS);
        }
    }

    #[test]
    fn free_fly_has_no_gravity_or_floor() {
        let mut ctl = free_fly();
        ctl.camera.pitch = -60.0;
        for _ in 0..20 {
            ctl.update(&InputSnapshot::new(0.1).with_action(Action::Forward));
        }
        assert!(ctl.camera.position.y < 0.0);
        assert_eq!(ctl.camera.vertical_velocity, 0.0);
        assert!(!ctl.camera.grounded);

        let y = ctl.camera.position.y;
        ctl.update(&InputSnapshot::new(1.0));
        assert_eq!(ctl.camera.position.y, y);
    }

    #[test]
    fn free_fly_follows_pitch() {
        let mut ctl = free_fly();
        ctl.camera.pitch = 45.0;
        let start = ctl.camera.position;
        ctl.update(&InputSnapshot::new(1.0).with_action(Action::Forward));
        let moved = ctl.camera.position - start;
        assert!((moved.length() - 5.0).abs() < EPS);
        assert!(moved.y > 3.0);
    }

    #[test]
    fn switching_policy_resets_vertical_state() {
        let mut ctl = grounded();
        ctl.update(&InputSnapshot::new(0.0).with_action(Action::JumpOrUp));
        assert_eq!(ctl.camera.vertical_velocity, 5.0);

        ctl.set_policy(MovementPolicy::FreeFly);
        assert_eq!(ctl.policy(), MovementPolicy::FreeFly);
        assert_eq!(ctl.camera.vertical_velocity, 0.0);
        assert!(!ctl.camera.grounded);

        ctl.camera.position.y = 4.0;
        ctl.set_policy(MovementPolicy::Grounded);
        assert!(!ctl.camera.grounded);
        ctl.update(&InputSnapshot::new(0.1));
        assert!(ctl.camera.position.y < 4.0);
    }

    #[test]
    fn grounded_policy_snaps_camera_below_floor() {
        let mut ctl = CameraController::new(
            Camera::new(Vec3::new(0.0, -3.0, 0.0)),
            MovementConfig::default(),
        );
        ctl.update(&InputSnapshot::new(0.016));
        assert_eq!(ctl.camera.position.y, 1.0);
        assert!(ctl.camera.grounded);
    }
}
