use core::ffi::c_void;

use crate::fill::{AppendStatus, EndStatus, FillInfo};
use crate::render::{Point, RenderGroup, RenderGroupId, RenderGroups, Vertex};
use crate::tessellate::{EarcutTessellator, Tessellator};
use crate::util::config::FillRule;

/// Opaque fill descriptor owned by the C side. Passed through, never dereferenced.
#[derive(Clone, Copy, Debug)]
pub struct FillHandle(pub *const c_void);

pub type InkFillInfo = FillInfo<FillHandle>;

/// Opaque handle passed to C: the render groups of one shape plus the tessellator
/// that fills them.
///
/// Design rule: C must treat this as an opaque pointer.
pub struct InkScene {
    groups: RenderGroups,
    tessellator: EarcutTessellator,
}

/// C group ids are arena index + 1 so that 0 can mean "no group".
fn group_id(id: u32) -> Option<RenderGroupId> {
    id.checked_sub(1).map(|i| RenderGroupId::from_index(i as usize))
}

#[no_mangle]
pub extern "C" fn ink_scene_create() -> *mut InkScene {
    crate::util::logging::init_logger();
    Box::into_raw(Box::new(InkScene { groups: RenderGroups::new(), tessellator: EarcutTessellator::new() }))
}

#[no_mangle]
pub extern "C" fn ink_scene_destroy(scene: *mut InkScene) {
    if scene.is_null() {
        return;
    }
    unsafe {
        drop(Box::from_raw(scene));
    }
}

/// `even_odd != 0` selects the even-odd rule, otherwise non-zero.
#[no_mangle]
pub extern "C" fn ink_scene_set_fill_rule(scene: *mut InkScene, even_odd: i32) {
    if scene.is_null() {
        return;
    }
    let scene = unsafe { &mut *scene };
    scene.tessellator.set_fill_rule(if even_odd != 0 { FillRule::EvenOdd } else { FillRule::NonZero });
}

/// Returns the new group's id, or 0 if `scene` is null.
#[no_mangle]
pub extern "C" fn ink_render_group_create(scene: *mut InkScene) -> u32 {
    if scene.is_null() {
        return 0;
    }
    let scene = unsafe { &mut *scene };
    let id = scene.groups.insert(RenderGroup::new());
    (id.index() + 1) as u32
}

#[no_mangle]
pub extern "C" fn ink_render_group_vertex_count(scene: *const InkScene, group: u32) -> u32 {
    if scene.is_null() {
        return 0;
    }
    let scene = unsafe { &*scene };
    group_id(group)
        .and_then(|id| scene.groups.get(id))
        .map(|g| g.vertex_count() as u32)
        .unwrap_or(0)
}

/// Borrow a group's vertices. Valid until the next call that mutates the scene.
#[no_mangle]
pub extern "C" fn ink_render_group_vertices(scene: *const InkScene, group: u32, out_len: *mut u32) -> *const Vertex {
    let slice: &[Vertex] = if scene.is_null() {
        &[]
    } else {
        let scene = unsafe { &*scene };
        group_id(group)
            .and_then(|id| scene.groups.get(id))
            .and_then(|g| g.vertices())
            .map(|b| b.as_slice())
            .unwrap_or(&[])
    };
    if !out_len.is_null() {
        unsafe { *out_len = slice.len() as u32 };
    }
    if slice.is_empty() {
        core::ptr::null()
    } else {
        slice.as_ptr()
    }
}

/// Returns null when `scene` is null or `group` does not exist.
#[no_mangle]
pub extern "C" fn ink_fill_generator_create(scene: *const InkScene, group: u32, fill: *const c_void) -> *mut InkFillInfo {
    if scene.is_null() {
        return core::ptr::null_mut();
    }
    let scene = unsafe { &*scene };
    let Some(info) = group_id(group).and_then(|id| FillInfo::create(&scene.groups, id, FillHandle(fill))) else {
        return core::ptr::null_mut();
    };
    Box::into_raw(Box::new(info))
}

fn append(scene: *mut InkScene, info: *mut InkFillInfo, x: f32, y: f32, start_contour: bool) -> u32 {
    if scene.is_null() || info.is_null() {
        return 0;
    }
    let (scene, info) = unsafe { (&mut *scene, &mut *info) };
    let p = Point::new(x, y);
    let status = if start_contour {
        info.move_to(&mut scene.groups, p)
    } else {
        info.line_to(&mut scene.groups, p)
    };
    matches!(status, AppendStatus::Appended { .. }) as u32
}

/// Returns 1 if the point was appended, 0 otherwise.
#[no_mangle]
pub extern "C" fn ink_fill_generator_move_to(scene: *mut InkScene, info: *mut InkFillInfo, x: f32, y: f32) -> u32 {
    append(scene, info, x, y, true)
}

/// Returns 1 if the point was appended, 0 otherwise.
#[no_mangle]
pub extern "C" fn ink_fill_generator_line_to(scene: *mut InkScene, info: *mut InkFillInfo, x: f32, y: f32) -> u32 {
    append(scene, info, x, y, false)
}

/// Tessellate the outline into `target`. Returns the number of vertices appended.
#[no_mangle]
pub extern "C" fn ink_fill_generator_end(scene: *mut InkScene, info: *const InkFillInfo, target: u32) -> u32 {
    if scene.is_null() || info.is_null() {
        return 0;
    }
    let (scene, info) = unsafe { (&mut *scene, &*info) };
    let Some(target) = group_id(target) else {
        return 0;
    };
    let tessellator: &mut dyn Tessellator = &mut scene.tessellator;
    match info.end(Some(tessellator), &mut scene.groups, target) {
        EndStatus::Expanded { appended } => appended as u32,
        EndStatus::Skipped(_) => 0,
    }
}

#[no_mangle]
pub extern "C" fn ink_fill_generator_destroy(info: *mut InkFillInfo) {
    if info.is_null() {
        return;
    }
    let info = unsafe { Box::from_raw(info) };
    info.destroy();
}
