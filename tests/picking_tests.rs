use std::cell::{Cell, RefCell};
use std::rc::Rc;

use glam::Vec3;

use flipbook::camera::OrbitCamera;
use flipbook::math::Aabb;
use flipbook::picking::PickRouter;
use flipbook::player::{PlaybackConfig, SequencePlayer};
use flipbook::scene::{Material, Mesh, Node, NodeHandle, RedrawFlag};
use flipbook::schedule::Scheduler;
use flipbook::sequence::{DirLocator, SequenceId};
use flipbook::texture::{ImageLoader, LoadResult};

const VIEW_W: f32 = 800.0;
const VIEW_H: f32 = 600.0;

/// Camera on the +z axis looking at the origin; quads in the xy plane at
/// chosen depths sit at known ray distances from it.
fn camera() -> OrbitCamera {
    OrbitCamera::from_position_target(Vec3::new(0.0, 0.0, 20.0), Vec3::ZERO)
}

fn quad_at_depth(name: &str, z: f32) -> NodeHandle {
    Node::with_mesh(
        name,
        Mesh {
            bounds: Aabb::new(Vec3::new(-4.0, -4.0, z), Vec3::new(4.0, 4.0, z)),
            material: Material::colored([0.5, 0.5, 0.5]),
        },
    )
}

fn world(nodes: impl IntoIterator<Item = NodeHandle>) -> NodeHandle {
    let root = Node::new("world");
    root.borrow_mut().children.extend(nodes);
    root
}

#[test]
fn nearest_registered_target_wins() {
    // Distance 5 and distance 10 from the camera at z=20.
    let near = quad_at_depth("near", 15.0);
    let far = quad_at_depth("far", 10.0);
    let root = world([near.clone(), far.clone()]);

    let near_hits = Rc::new(Cell::new(0u32));
    let far_hits = Rc::new(Cell::new(0u32));

    let mut router = PickRouter::new();
    {
        let n = near_hits.clone();
        router.register(Rc::downgrade(&near), move || n.set(n.get() + 1));
    }
    {
        let f = far_hits.clone();
        router.register(Rc::downgrade(&far), move || f.set(f.get() + 1));
    }

    let toggled =
        router.handle_pointer_event(VIEW_W / 2.0, VIEW_H / 2.0, VIEW_W, VIEW_H, &camera(), &root);

    assert!(toggled);
    assert_eq!(near_hits.get(), 1, "the closer target takes the click");
    assert_eq!(far_hits.get(), 0, "one event never fires two toggles");
}

#[test]
fn unregistered_geometry_does_not_swallow_the_click() {
    // The aquarium glass sits in front of the screen but is not a
    // toggle target; the click goes through to the screen.
    let glass = quad_at_depth("glass", 15.0);
    let screen = quad_at_depth("screen", 10.0);
    let root = world([glass, screen.clone()]);

    let hits = Rc::new(Cell::new(0u32));
    let mut router = PickRouter::new();
    {
        let h = hits.clone();
        router.register(Rc::downgrade(&screen), move || h.set(h.get() + 1));
    }

    let toggled =
        router.handle_pointer_event(VIEW_W / 2.0, VIEW_H / 2.0, VIEW_W, VIEW_H, &camera(), &root);
    assert!(toggled);
    assert_eq!(hits.get(), 1);
}

#[test]
fn missing_everything_is_a_quiet_no_op() {
    let screen = quad_at_depth("screen", 10.0);
    let root = world([screen.clone()]);

    let hits = Rc::new(Cell::new(0u32));
    let mut router = PickRouter::new();
    {
        let h = hits.clone();
        router.register(Rc::downgrade(&screen), move || h.set(h.get() + 1));
    }

    // Top-left corner: the ray passes well outside the quad.
    let toggled = router.handle_pointer_event(1.0, 1.0, VIEW_W, VIEW_H, &camera(), &root);
    assert!(!toggled);
    assert_eq!(hits.get(), 0);
}

#[test]
fn coincident_registered_targets_fire_exactly_once() {
    let a = quad_at_depth("a", 10.0);
    let b = quad_at_depth("b", 10.0);
    let root = world([a.clone(), b.clone()]);

    let total = Rc::new(Cell::new(0u32));
    let mut router = PickRouter::new();
    for node in [&a, &b] {
        let t = total.clone();
        router.register(Rc::downgrade(node), move || t.set(t.get() + 1));
    }

    router.handle_pointer_event(VIEW_W / 2.0, VIEW_H / 2.0, VIEW_W, VIEW_H, &camera(), &root);
    assert_eq!(total.get(), 1);
}

#[test]
fn registration_for_a_torn_down_target_is_skipped() {
    let screen = quad_at_depth("screen", 10.0);
    let root = world([]);

    let hits = Rc::new(Cell::new(0u32));
    let mut router = PickRouter::new();
    {
        let h = hits.clone();
        router.register(Rc::downgrade(&screen), move || h.set(h.get() + 1));
    }
    drop(screen);

    let toggled =
        router.handle_pointer_event(VIEW_W / 2.0, VIEW_H / 2.0, VIEW_W, VIEW_H, &camera(), &root);
    assert!(!toggled);
    assert_eq!(hits.get(), 0);
}

/// Loader that never resolves; these tests only watch the request log.
struct SilentLoader {
    log: RefCell<Vec<String>>,
}

impl ImageLoader for SilentLoader {
    fn request(&self, locator: &str, _on_done: Box<dyn FnOnce(LoadResult)>) {
        self.log.borrow_mut().push(locator.to_string());
    }
}

#[test]
fn click_toggles_the_playing_sequence_end_to_end() {
    let screen = quad_at_depth("screen", 10.0);
    let root = world([screen.clone()]);

    let scheduler = Scheduler::new();
    let loader = Rc::new(SilentLoader {
        log: RefCell::new(Vec::new()),
    });
    let player = SequencePlayer::new(
        PlaybackConfig::new(80, 10.0, DirLocator::new("frames")),
        Rc::downgrade(&screen),
        scheduler.clone(),
        loader.clone(),
        RedrawFlag::new(),
    );
    player.start(SequenceId::from("ad")).unwrap();

    let mut router = PickRouter::new();
    {
        let p = player.clone();
        let (a, b) = (SequenceId::from("ad"), SequenceId::from("ad_2"));
        router.register(Rc::downgrade(&screen), move || {
            let next = match p.current_sequence() {
                Some(current) if current == a => b.clone(),
                _ => a.clone(),
            };
            p.switch_to(next);
        });
    }

    scheduler.advance_by(std::time::Duration::from_millis(150));
    router.handle_pointer_event(VIEW_W / 2.0, VIEW_H / 2.0, VIEW_W, VIEW_H, &camera(), &root);
    assert_eq!(player.current_sequence(), Some(SequenceId::from("ad_2")));

    scheduler.advance_by(std::time::Duration::from_millis(100));
    assert_eq!(loader.log.borrow().last().unwrap(), "frames/ad_2/ad_2_00000.jpg");

    // Click again: back to the initial sequence, from frame 0.
    router.handle_pointer_event(VIEW_W / 2.0, VIEW_H / 2.0, VIEW_W, VIEW_H, &camera(), &root);
    assert_eq!(player.current_sequence(), Some(SequenceId::from("ad")));
    scheduler.advance_by(std::time::Duration::from_millis(100));
    assert_eq!(loader.log.borrow().last().unwrap(), "frames/ad/ad_00000.jpg");
}
