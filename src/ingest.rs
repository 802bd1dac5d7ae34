use crate::{
    dispatch::Event,
    error::Error,
    parse::{parse_people, value_int},
    pose::BoundingBox,
};
use crossbeam::channel::Sender;
use serde_json::Value;
use std::{
    io::BufRead,
    sync::atomic::{AtomicBool, Ordering},
};
use tracing::{error, trace, warn};

/// Size of the device's image event buffer, minus the terminating NUL.
pub(crate) const MAX_IMAGE_PAYLOAD: usize = 15 * 1024 - 1;

/// Hand an event to the render side. Blocks while the queue is full.
pub(crate) fn post(events: &Sender<Event>, event: Event) -> Result<(), Error> {
    events.send(event).map_err(|_| Error::PostEvent)
}

fn truncate(s: &str, max: usize) -> &str {
    let mut end = max.min(s.len());
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// A top-level detection box: at least six items, the first six used, and
/// anything non-numeric read as zero.
fn detection_box(item: &Value) -> Option<BoundingBox> {
    let items = item.as_array().filter(|items| items.len() >= BoundingBox::LEN)?;
    let mut values = [0; BoundingBox::LEN];
    for (slot, item) in values.iter_mut().zip(items) {
        *slot = value_int(item).unwrap_or_default();
    }
    Some(BoundingBox::from_array(values))
}

/// Split one frame message into events, posted in order: image, boxes,
/// people.
pub(crate) fn process_message(message: &Value, events: &Sender<Event>) -> Result<(), Error> {
    if let Some(img) = message.get("img").and_then(Value::as_str) {
        post(
            events,
            Event::Image(truncate(img, MAX_IMAGE_PAYLOAD).to_owned()),
        )?;
    }

    if let Some(boxes) = message.get("boxes").and_then(Value::as_array) {
        for bbox in boxes.iter().filter_map(detection_box) {
            post(events, Event::Box(bbox))?;
        }
    }

    match parse_people(message.get("keypoints")) {
        Ok(frame) => post(events, Event::People(frame))?,
        Err(Error::EmptyOrInvalidInput) => trace!(message = "no people in frame"),
        Err(e) if e.is_out_of_memory() => warn!(message = "dropping keypoints", error = %e),
        Err(e) => return Err(e),
    }
    Ok(())
}

/// Parse and dispatch one line of input. Lines that are not JSON are logged
/// and skipped.
pub(crate) fn process_line(line: &str, events: &Sender<Event>) -> Result<(), Error> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(());
    }
    match serde_json::from_str::<Value>(line) {
        Ok(message) => process_message(&message, events),
        Err(e) => {
            error!(message = "invalid JSON string", error = %e, len = line.len());
            Ok(())
        }
    }
}

/// Feed newline-delimited frames to the render side until the input ends or
/// `running` is cleared. Returns the number of lines read.
///
/// `running` is checked between lines, so a reader blocked on an idle source
/// only notices the stop once it yields another line or EOF.
pub(crate) fn ingest<R>(
    reader: R,
    events: &Sender<Event>,
    running: &AtomicBool,
) -> Result<usize, Error>
where
    R: BufRead,
{
    let mut lines = 0;
    for line in reader.lines() {
        if !running.load(Ordering::SeqCst) {
            break;
        }
        process_line(&line.map_err(Error::ReadInput)?, events)?;
        lines += 1;
    }
    Ok(lines)
}
