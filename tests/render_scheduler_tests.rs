use scatter_rs::ScatterResult;
use scatter_rs::render::{FrameTarget, ManualFrameClock, RenderScheduler};

#[derive(Debug, Default)]
struct LogTarget {
    log: Vec<&'static str>,
    clears: usize,
    disposed: bool,
}

impl FrameTarget for LogTarget {
    fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn clear_all(&mut self) -> ScatterResult<()> {
        self.clears += 1;
        Ok(())
    }
}

fn scheduler() -> RenderScheduler<LogTarget, ManualFrameClock> {
    RenderScheduler::new(ManualFrameClock::new())
}

#[test]
fn second_render_supersedes_first_within_a_frame() {
    let mut scheduler = scheduler();
    let mut target = LogTarget::default();

    let first = scheduler
        .render(|target: &mut LogTarget| {
            target.log.push("fn1");
            Ok(())
        })
        .expect("scheduled");
    let second = scheduler
        .render(|target: &mut LogTarget| {
            target.log.push("fn2");
            Ok(())
        })
        .expect("scheduled");

    assert_ne!(first, second);
    assert_eq!(scheduler.requester().queued_len(), 1);
    assert_eq!(scheduler.requester().cancelled_count(), 1);

    let due = scheduler.requester_mut().drain_due();
    assert_eq!(due, vec![second]);
    for handle in due {
        assert!(scheduler.on_animation_frame(handle, &mut target).expect("frame"));
    }

    assert_eq!(target.log, vec!["fn2"]);
    assert_eq!(scheduler.frames_executed(), 1);
}

#[test]
fn stale_handle_is_ignored() {
    let mut scheduler = scheduler();
    let mut target = LogTarget::default();

    let first = scheduler
        .render(|target: &mut LogTarget| {
            target.log.push("fn1");
            Ok(())
        })
        .expect("scheduled");
    scheduler.render(|target: &mut LogTarget| {
        target.log.push("fn2");
        Ok(())
    });

    assert!(!scheduler.on_animation_frame(first, &mut target).expect("frame"));
    assert!(target.log.is_empty());
    assert!(scheduler.has_pending_frame());
}

#[test]
fn teardown_cancels_pending_frame_and_blocks_new_ones() {
    let mut scheduler = scheduler();
    let mut target = LogTarget::default();

    let handle = scheduler
        .render(|target: &mut LogTarget| {
            target.log.push("late");
            Ok(())
        })
        .expect("scheduled");
    scheduler.teardown();

    assert!(scheduler.is_torn_down());
    assert_eq!(scheduler.requester().queued_len(), 0);
    assert!(!scheduler.on_animation_frame(handle, &mut target).expect("frame"));
    assert!(scheduler.render(|_: &mut LogTarget| Ok(())).is_none());
    assert!(target.log.is_empty());
}

#[test]
fn frame_for_disposed_target_is_a_no_op() {
    let mut scheduler = scheduler();
    let mut target = LogTarget::default();

    let handle = scheduler
        .render(|target: &mut LogTarget| {
            target.log.push("draw");
            Ok(())
        })
        .expect("scheduled");
    target.disposed = true;

    assert!(!scheduler.on_animation_frame(handle, &mut target).expect("frame"));
    assert!(target.log.is_empty());
}

#[test]
fn clear_runs_immediately_without_a_frame() {
    let mut scheduler = scheduler();
    let mut target = LogTarget::default();

    scheduler.clear(&mut target).expect("clear");

    assert_eq!(target.clears, 1);
    assert_eq!(scheduler.requester().queued_len(), 0);
}
