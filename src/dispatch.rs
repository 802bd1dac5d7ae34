use crate::{
    canvas::Canvas,
    pose::{BoundingBox, Frame},
    render::{draw_box, render_frame, Style},
};
use crossbeam::channel::Receiver;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace};

/// Image events that must arrive after the last pose before the secondary
/// canvas is wiped.
const IMAGE_DELAY_FRAMES: u32 = 2;

/// What the ingest side posts to the render side. Every payload is owned by
/// the event, so posting moves it out of the producer.
#[derive(Debug)]
pub(crate) enum Event {
    /// Base64 JPEG text. Decoding and blitting happen elsewhere.
    Image(String),
    Box(BoundingBox),
    People(Frame),
}

/// The two canvases the device shows side by side: the camera image with
/// overlays, and a skeleton-only view.
#[derive(Debug)]
pub(crate) struct Canvases<C> {
    pub(crate) primary: C,
    pub(crate) secondary: C,
}

/// Both canvases sit behind one lock.
pub(crate) type SharedCanvases<C> = Arc<Mutex<Canvases<C>>>;

pub(crate) fn shared<C>(primary: C, secondary: C) -> SharedCanvases<C> {
    Arc::new(Mutex::new(Canvases { primary, secondary }))
}

/// A panicking drawer cannot leave the pixel buffers in an unusable state,
/// so a poisoned lock is simply taken over.
pub(crate) fn lock<C>(canvases: &SharedCanvases<C>) -> MutexGuard<'_, Canvases<C>> {
    canvases.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub(crate) struct Counts {
    pub(crate) images: usize,
    pub(crate) boxes: usize,
    pub(crate) frames: usize,
    pub(crate) people: usize,
}

pub(crate) struct Dispatcher<C> {
    canvases: SharedCanvases<C>,
    style: Style,
    image_delay: u32,
    secondary_cleared: bool,
    counts: Counts,
}

impl<C> Dispatcher<C>
where
    C: Canvas,
{
    pub(crate) fn new(canvases: SharedCanvases<C>, style: Style) -> Self {
        Self {
            canvases,
            style,
            image_delay: 0,
            secondary_cleared: false,
            counts: Counts::default(),
        }
    }

    pub(crate) fn handle(&mut self, event: Event) {
        match event {
            Event::Image(payload) => {
                self.counts.images += 1;
                trace!(message = "image received", len = payload.len());

                let mut canvases = lock(&self.canvases);
                if !self.secondary_cleared {
                    self.image_delay += 1;
                    if self.image_delay >= IMAGE_DELAY_FRAMES {
                        self.secondary_cleared = true;
                        debug!(message = "no recent pose, clearing secondary canvas");
                        canvases.secondary.clear(self.style.background);
                    }
                }
            }
            Event::Box(bbox) => {
                self.counts.boxes += 1;
                trace!(
                    message = "box received",
                    score = bbox.score,
                    target = bbox.target
                );
                draw_box(&mut lock(&self.canvases).primary, &bbox, &self.style);
            }
            Event::People(frame) => {
                self.counts.frames += 1;
                self.counts.people += frame.len();
                self.image_delay = 0;
                self.secondary_cleared = false;

                {
                    let mut guard = lock(&self.canvases);
                    let canvases = &mut *guard;
                    canvases.secondary.clear(self.style.background);
                    render_frame(&mut canvases.primary, &frame, &self.style);
                    render_frame(&mut canvases.secondary, &frame, &self.style);
                }

                // the only place a frame is released
                drop(frame);
            }
        }
    }

    /// Handle events in order until every sender has hung up.
    pub(crate) fn run(
        &mut self,
        events: &Receiver<Event>,
        progress: Option<&indicatif::ProgressBar>,
    ) -> Counts {
        for event in events.iter() {
            self.handle(event);
            if let Some(progress) = progress {
                let Counts { frames, people, .. } = self.counts;
                progress.set_message(format!("frames: {}, people: {}", frames, people));
                progress.inc(1);
            }
        }
        self.counts
    }
}

#[cfg(test)]
mod tests {
    use super::{lock, shared, Counts, Dispatcher, Event};
    use crate::{
        canvas::{
            recording::{DrawCall, RecordingCanvas},
            Color, RasterCanvas, CANVAS_SIZE,
        },
        ingest::process_line,
        parse::{counting, parse_people},
        pose::{BoundingBox, Frame, Joint, Person},
        render::Style,
        skeleton::SKELETON_CONNECTIONS,
    };
    use serde_json::json;

    fn complete_frame() -> Frame {
        Frame::new(vec![Person {
            bbox: BoundingBox::default(),
            points: (0..17).map(|i| Joint::new(10 * i, 10 * i, 50)).collect(),
        }])
    }

    fn dispatcher() -> Dispatcher<RecordingCanvas> {
        let canvases = shared(RecordingCanvas::default(), RecordingCanvas::default());
        Dispatcher::new(canvases, Style::default())
    }

    fn clears(canvas: &RecordingCanvas) -> usize {
        canvas
            .calls
            .iter()
            .filter(|call| matches!(call, DrawCall::Clear(_)))
            .count()
    }

    #[test]
    fn people_render_on_both_canvases() {
        let mut dispatcher = dispatcher();
        dispatcher.handle(Event::People(complete_frame()));

        let canvases = lock(&dispatcher.canvases);
        let draws = 17 + SKELETON_CONNECTIONS.len();
        assert_eq!(canvases.primary.calls.len(), draws);
        assert_eq!(canvases.secondary.calls.len(), draws + 1);
        assert_eq!(
            canvases.secondary.calls[0],
            DrawCall::Clear(Style::default().background)
        );
        assert_eq!(clears(&canvases.primary), 0);
    }

    #[test]
    fn secondary_is_cleared_on_second_image_after_pose() {
        let mut dispatcher = dispatcher();
        dispatcher.handle(Event::People(complete_frame()));
        let after_pose = clears(&lock(&dispatcher.canvases).secondary);

        dispatcher.handle(Event::Image("a".into()));
        assert_eq!(clears(&lock(&dispatcher.canvases).secondary), after_pose);

        dispatcher.handle(Event::Image("b".into()));
        assert_eq!(clears(&lock(&dispatcher.canvases).secondary), after_pose + 1);

        for _ in 0..5 {
            dispatcher.handle(Event::Image("c".into()));
        }
        assert_eq!(clears(&lock(&dispatcher.canvases).secondary), after_pose + 1);

        // a new pose re-arms the delay
        dispatcher.handle(Event::People(complete_frame()));
        dispatcher.handle(Event::Image("d".into()));
        dispatcher.handle(Event::Image("e".into()));
        assert_eq!(clears(&lock(&dispatcher.canvases).secondary), after_pose + 3);
        assert_eq!(clears(&lock(&dispatcher.canvases).primary), 0);
    }

    #[test]
    fn boxes_draw_on_primary_only() {
        let mut dispatcher = dispatcher();
        dispatcher.handle(Event::Box(BoundingBox::from_array([50, 50, 10, 10, 90, 1])));
        let canvases = lock(&dispatcher.canvases);
        assert_eq!(canvases.primary.lines().len(), 4);
        assert!(canvases.secondary.calls.is_empty());
    }

    #[test]
    fn frame_is_released_after_rendering() {
        let canvases = shared(
            RecordingCanvas {
                calls: Vec::with_capacity(64),
            },
            RecordingCanvas {
                calls: Vec::with_capacity(64),
            },
        );
        let mut dispatcher = Dispatcher::new(canvases, Style::default());
        let points = (0..17).map(|i| [i, i, 50]).collect::<Vec<_>>();
        let input = json!([{ "points": points }]);

        let before = counting::live_bytes();
        let frame = parse_people(Some(&input)).unwrap();
        dispatcher.handle(Event::People(frame));
        assert_eq!(counting::live_bytes(), before);
    }

    #[test]
    fn run_drains_queue_in_order() {
        let (tx, rx) = crossbeam::channel::bounded(1);
        let mut dispatcher = dispatcher();

        crossbeam::thread::scope(|scope| {
            scope.spawn(move |_| {
                tx.send(Event::Image("img".into())).unwrap();
                tx.send(Event::Box(BoundingBox::default())).unwrap();
                tx.send(Event::People(complete_frame())).unwrap();
                tx.send(Event::People(Frame::new(vec![Person::default()])))
                    .unwrap();
            });
            let counts = dispatcher.run(&rx, None);
            assert_eq!(
                counts,
                Counts {
                    images: 1,
                    boxes: 1,
                    frames: 2,
                    people: 2,
                }
            );
        })
        .unwrap();

        // the incomplete person of the last frame draws nothing
        let canvases = lock(&dispatcher.canvases);
        assert_eq!(canvases.primary.lines().len(), 4 + SKELETON_CONNECTIONS.len());
        assert_eq!(
            canvases.secondary.calls.last(),
            Some(&DrawCall::Clear(Style::default().background))
        );
    }

    #[test]
    fn extreme_device_box_keeps_render_side_alive() {
        let (tx, rx) = crossbeam::channel::unbounded();
        process_line(r#"{"boxes":[[2147483647,0,2147483647,10,90,0]]}"#, &tx).unwrap();
        process_line(r#"{"boxes":[[120,120,2147483647,100,90,0]]}"#, &tx).unwrap();
        drop(tx);

        let canvases = shared(
            RasterCanvas::new(CANVAS_SIZE, CANVAS_SIZE, Color::BLACK),
            RasterCanvas::new(CANVAS_SIZE, CANVAS_SIZE, Color::BLACK),
        );
        let mut dispatcher = Dispatcher::new(canvases, Style::default());
        let counts = dispatcher.run(&rx, None);
        assert_eq!(counts.boxes, 2);

        let canvases = lock(&dispatcher.canvases);
        let edge = Some(Style::default().box_line.color);
        assert_eq!(canvases.primary.pixel(0, 70), edge);
        assert_eq!(canvases.primary.pixel(239, 170), edge);
        assert_eq!(canvases.secondary.pixel(0, 70), Some(Color::BLACK));
    }
}
