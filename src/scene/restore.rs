use super::loader::ResourceLoader;
use crate::draw::canvas::{CompositingCanvas, ObjectId};
use crate::draw::object::{DrawObject, ObjectData};
use log::{debug, warn};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Outcome of queuing a restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RestoreSummary {
    /// Records inserted before `restore_into` returned.
    pub inserted: usize,
    /// Records waiting on the loader.
    pub deferred: usize,
    /// Records rejected as invalid.
    pub rejected: usize,
}

/// Restored ids by record index, shared by every completion callback.
type Slots = Rc<RefCell<Vec<Option<ObjectId>>>>;

/// Rebuilds `objects` into `canvas`, bottom to top.
///
/// Synchronous records are inserted before this returns; image and eraser
/// records are inserted when `loader.run_pending()` delivers them. Each record
/// lands directly above the nearest earlier record that is already on the
/// canvas, so late arrivals keep their place in the stack. A completion that
/// finds the canvas dropped or disposed is discarded.
///
/// The canvas must not be borrowed while `loader.run_pending()` runs.
pub fn restore_into(
    canvas: &Rc<RefCell<CompositingCanvas>>,
    objects: Vec<ObjectData>,
    loader: &mut dyn ResourceLoader,
) -> RestoreSummary {
    let slots: Slots = Rc::new(RefCell::new(vec![None; objects.len()]));
    let mut summary = RestoreSummary::default();

    for (index, data) in objects.into_iter().enumerate() {
        let kind = data.kind_name();
        let weak = Rc::downgrade(canvas);
        let slot_table = Rc::clone(&slots);
        let done = Box::new(move |object: DrawObject| {
            insert_restored(&weak, &slot_table, index, object);
        });

        match DrawObject::from_object(data, loader, done) {
            Ok(()) if slots.borrow()[index].is_some() => summary.inserted += 1,
            Ok(()) => summary.deferred += 1,
            Err(err) => {
                warn!("Skipping {kind} record {index}: {err}");
                summary.rejected += 1;
            }
        }
    }

    debug!(
        "Restore queued: {} inserted, {} deferred, {} rejected",
        summary.inserted, summary.deferred, summary.rejected
    );
    summary
}

fn insert_restored(
    canvas: &Weak<RefCell<CompositingCanvas>>,
    slots: &Slots,
    index: usize,
    object: DrawObject,
) {
    let Some(canvas) = canvas.upgrade() else {
        debug!("Dropping restored {} record {index}: canvas is gone", object.kind_name());
        return;
    };
    let Ok(mut canvas) = canvas.try_borrow_mut() else {
        warn!(
            "Dropping restored {} record {index}: canvas is busy",
            object.kind_name()
        );
        return;
    };
    if !canvas.is_alive() {
        warn!(
            "Dropping restored {} record {index}: canvas was disposed",
            object.kind_name()
        );
        return;
    }

    let position = {
        let slots = slots.borrow();
        let below = slots[..index]
            .iter()
            .rev()
            .flatten()
            .find_map(|id| canvas.index_of(*id).ok());
        let above = || {
            slots[index + 1..]
                .iter()
                .flatten()
                .find_map(|id| canvas.index_of(*id).ok())
        };
        match below {
            Some(i) => i + 1,
            None => above().unwrap_or(canvas.len()),
        }
    };

    match canvas.insert_at(position, object) {
        Ok(id) => slots.borrow_mut()[index] = Some(id),
        Err(err) => warn!("Failed to insert restored record {index}: {err}"),
    }
}
