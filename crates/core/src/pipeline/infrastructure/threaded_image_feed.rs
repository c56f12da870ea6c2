use std::path::PathBuf;
use std::sync::Arc;

use crate::imaging::domain::image_reader::ImageReader;
use crate::pipeline::image_feed::{ImageFeed, ImageSink};
use crate::shared::frame::Frame;
use crate::shared::item_failure::error_chain;

const DEFAULT_CHANNEL_CAPACITY: usize = 4;

type SendError = Box<dyn std::error::Error + Send + Sync>;
type Decoded = (PathBuf, Result<Frame, SendError>);

/// Decodes photos on a dedicated reader thread.
///
/// Layout: `reader → bounded channel → caller [sink]`
///
/// Decoding of the next photo overlaps detection of the current one. The
/// channel is FIFO, so the sink sees photos in listing order.
pub struct ThreadedImageFeed {
    channel_capacity: usize,
}

impl ThreadedImageFeed {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(channel_capacity: usize) -> Self {
        Self {
            channel_capacity: channel_capacity.max(1),
        }
    }
}

impl Default for ThreadedImageFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageFeed for ThreadedImageFeed {
    fn feed(
        &self,
        reader: Arc<dyn ImageReader>,
        images: Vec<PathBuf>,
        sink: &mut ImageSink<'_>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let (tx, rx) = crossbeam_channel::bounded::<Decoded>(self.channel_capacity);
        let handle = spawn_reader(reader, images, tx);

        for (path, decoded) in rx {
            let decoded = decoded.map_err(|e| -> Box<dyn std::error::Error> { e.to_string().into() });
            sink(path.as_path(), decoded);
        }

        handle
            .join()
            .map_err(|_| -> Box<dyn std::error::Error> { "Reader thread panicked".into() })
    }
}

fn spawn_reader(
    reader: Arc<dyn ImageReader>,
    images: Vec<PathBuf>,
    tx: crossbeam_channel::Sender<Decoded>,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        for path in images {
            let decoded = reader
                .read(&path)
                .map_err(|e| -> SendError { error_chain(e.as_ref()).into() });
            if tx.send((path, decoded)).is_err() {
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::image_feed::tests::{collect, NameReader};
    use crate::pipeline::image_feed::SequentialImageFeed;

    #[test]
    fn test_threaded_feed_matches_sequential() {
        let names = ["b.jpg", "bad_1.jpg", "a.jpg", "z.jpg", "m.jpg", "bad_2.jpg"];

        let sequential = collect(&SequentialImageFeed, &names);
        let threaded = collect(&ThreadedImageFeed::with_capacity(1), &names);

        assert_eq!(threaded, sequential);
    }

    #[test]
    fn test_every_image_read_once() {
        let reader = Arc::new(NameReader::new());
        let images: Vec<PathBuf> = (0..20).map(|i| PathBuf::from(format!("{i}.jpg"))).collect();
        let mut count = 0;

        ThreadedImageFeed::new()
            .feed(reader.clone(), images.clone(), &mut |_, _| count += 1)
            .unwrap();

        assert_eq!(count, 20);
        assert_eq!(*reader.reads.lock().unwrap(), images);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        assert_eq!(ThreadedImageFeed::with_capacity(0).channel_capacity, 1);
    }
}
