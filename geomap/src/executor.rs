//! Render-affinity execution context.
//!
//! Constructing a native image handle from decoded bytes must happen on a
//! single designated execution context: historically the UI thread, because
//! the underlying graphics toolkit requires it. The cache core only depends
//! on the [`RenderExecutor`] trait, so the same logic runs unchanged in a
//! GUI host (which supplies its own dispatcher) or a headless one.
//!
//! Two implementations are provided:
//!
//! - [`ImmediateExecutor`] runs tasks inline on the calling thread
//! - [`RenderThread`] owns a dedicated worker thread fed by a channel

use std::io;
use std::sync::mpsc;
use std::thread;

use image::{DynamicImage, ImageError};
use parking_lot::Mutex;
use tracing::debug;

/// A unit of work that produces a native image handle.
pub type RenderTask = Box<dyn FnOnce() -> Result<DynamicImage, ImageError> + Send>;

/// Execution context with render affinity.
///
/// Implementations must run every submitted task on the same single
/// execution context and block the caller until the task completes.
pub trait RenderExecutor: Send + Sync {
    /// Run the task on the render-affinity context and wait for its result.
    fn submit_and_wait(&self, task: RenderTask) -> Result<DynamicImage, ImageError>;
}

/// Runs tasks inline on the calling thread.
///
/// Suitable for headless hosts and tests, where no toolkit imposes a thread
/// requirement on image construction.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImmediateExecutor;

impl RenderExecutor for ImmediateExecutor {
    fn submit_and_wait(&self, task: RenderTask) -> Result<DynamicImage, ImageError> {
        task()
    }
}

struct Job {
    task: RenderTask,
    reply: mpsc::Sender<Result<DynamicImage, ImageError>>,
}

/// A dedicated worker thread with render affinity.
///
/// Tasks are sent over a channel and executed one at a time on the worker;
/// `submit_and_wait` blocks on a reply channel. Dropping the executor closes
/// the channel and joins the worker.
pub struct RenderThread {
    sender: Mutex<Option<mpsc::Sender<Job>>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl RenderThread {
    /// Spawn the worker thread.
    pub fn new() -> io::Result<Self> {
        let (sender, receiver) = mpsc::channel::<Job>();

        let handle = thread::Builder::new()
            .name("geomap-render".to_string())
            .spawn(move || {
                while let Ok(job) = receiver.recv() {
                    let result = (job.task)();
                    // A dropped reply receiver means the caller gave up
                    let _ = job.reply.send(result);
                }
                debug!("render thread shutting down");
            })?;

        Ok(Self {
            sender: Mutex::new(Some(sender)),
            handle: Some(handle),
        })
    }
}

impl RenderExecutor for RenderThread {
    fn submit_and_wait(&self, task: RenderTask) -> Result<DynamicImage, ImageError> {
        let (reply_tx, reply_rx) = mpsc::channel();

        {
            let guard = self.sender.lock();
            let sender = guard.as_ref().ok_or_else(closed_error)?;
            sender
                .send(Job {
                    task,
                    reply: reply_tx,
                })
                .map_err(|_| closed_error())?;
        }

        reply_rx.recv().map_err(|_| closed_error())?
    }
}

impl Drop for RenderThread {
    fn drop(&mut self) {
        // Closing the channel stops the worker loop
        self.sender.lock().take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn closed_error() -> ImageError {
    ImageError::IoError(io::Error::new(
        io::ErrorKind::BrokenPipe,
        "render thread is no longer running",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_immediate_executor_runs_task() {
        let executor = ImmediateExecutor;
        let result = executor.submit_and_wait(Box::new(|| Ok(DynamicImage::new_rgba8(2, 2))));
        assert!(result.is_ok());
        let image = result.unwrap();
        assert_eq!(image.width(), 2);
        assert_eq!(image.height(), 2);
    }

    #[test]
    fn test_immediate_executor_propagates_errors() {
        let executor = ImmediateExecutor;
        let result = executor.submit_and_wait(Box::new(|| {
            Err(ImageError::IoError(io::Error::new(
                io::ErrorKind::InvalidData,
                "bad payload",
            )))
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_render_thread_runs_tasks_on_one_thread() {
        let executor = RenderThread::new().unwrap();

        let first = executor
            .submit_and_wait(Box::new(|| {
                let name = thread::current().name().map(str::to_string);
                assert_eq!(name.as_deref(), Some("geomap-render"));
                Ok(DynamicImage::new_rgba8(1, 1))
            }))
            .unwrap();
        assert_eq!(first.width(), 1);

        let second = executor
            .submit_and_wait(Box::new(|| Ok(DynamicImage::new_rgba8(4, 4))))
            .unwrap();
        assert_eq!(second.width(), 4);
    }

    #[test]
    fn test_render_thread_propagates_task_error() {
        let executor = RenderThread::new().unwrap();
        let result = executor.submit_and_wait(Box::new(|| {
            Err(ImageError::IoError(io::Error::new(
                io::ErrorKind::InvalidData,
                "bad payload",
            )))
        }));
        assert!(result.is_err());
    }
}
