use crate::render::{
    AssetReader,
    render::{self, RenderError},
    render_request::{AssetValues, PointRequest, RenderedTile, TileRequest},
};
use std::{
    sync::{Arc, Mutex},
    thread::JoinHandle,
};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

enum RenderTask {
    Tile {
        request: TileRequest,
        resp_tx: oneshot::Sender<Result<RenderedTile, RenderError>>,
    },
    Point {
        request: PointRequest,
        resp_tx: oneshot::Sender<Result<Vec<AssetValues>, RenderError>>,
    },
}

/// Fixed set of threads doing the blocking raster I/O. Each thread owns its
/// own reader.
pub(crate) struct RenderWorkerPool {
    tx: Mutex<Option<mpsc::Sender<RenderTask>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum ReError {
    #[error(transparent)]
    RenderError(#[from] RenderError),

    #[error("worker response dropped: {0}")]
    RecvError(#[from] oneshot::error::RecvError),

    #[error("worker queue closed")]
    QueueClosed,
}

impl RenderWorkerPool {
    pub(crate) fn new<R, F>(worker_count: usize, make_reader: F) -> std::io::Result<Self>
    where
        R: AssetReader,
        F: Fn() -> R + Send + Sync + 'static,
    {
        let queue_size = worker_count.max(1) * 2;
        let (tx, rx) = mpsc::channel(queue_size);
        let rx = Arc::new(Mutex::new(rx));
        let make_reader = Arc::new(make_reader);
        let mut workers = Vec::with_capacity(worker_count);

        for worker_id in 0..worker_count {
            let rx = rx.clone();
            let make_reader = make_reader.clone();

            let handle = std::thread::Builder::new()
                .name(format!("render-worker-{worker_id}"))
                .spawn(move || {
                    let mut reader = make_reader();

                    loop {
                        let task = {
                            let mut guard = rx.lock().unwrap();
                            guard.blocking_recv()
                        };

                        // Ignore send errors (client dropped).
                        match task {
                            Some(RenderTask::Tile { request, resp_tx }) => {
                                let _ = resp_tx.send(render::render_tile(&request, &mut reader));
                            }
                            Some(RenderTask::Point { request, resp_tx }) => {
                                let _ = resp_tx.send(render::query_point(&request, &mut reader));
                            }
                            None => break,
                        }
                    }

                    debug!(worker_id, "render worker finished");
                })?;

            workers.push(handle);
        }

        Ok(Self {
            tx: Mutex::new(Some(tx)),
            workers: Mutex::new(workers),
        })
    }

    fn sender(&self) -> Result<mpsc::Sender<RenderTask>, ReError> {
        let guard = self.tx.lock().unwrap();
        guard.clone().ok_or(ReError::QueueClosed)
    }

    pub(crate) async fn render_tile(&self, request: TileRequest) -> Result<RenderedTile, ReError> {
        let (resp_tx, resp_rx) = oneshot::channel();

        self.sender()?
            .send(RenderTask::Tile { request, resp_tx })
            .await
            .map_err(|_| ReError::QueueClosed)?;

        Ok(resp_rx.await??)
    }

    pub(crate) async fn query_point(
        &self,
        request: PointRequest,
    ) -> Result<Vec<AssetValues>, ReError> {
        let (resp_tx, resp_rx) = oneshot::channel();

        self.sender()?
            .send(RenderTask::Point { request, resp_tx })
            .await
            .map_err(|_| ReError::QueueClosed)?;

        Ok(resp_rx.await??)
    }

    pub(crate) fn shutdown(&self) {
        let tx = self.tx.lock().unwrap().take();
        drop(tx);

        let mut workers = self.workers.lock().unwrap();
        for handle in workers.drain(..) {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        mosaic::ReaderOptions,
        render::{FakeReader, ImageFormat, PixelSelection},
    };
    use geo::Rect;

    fn pool() -> RenderWorkerPool {
        let reader = FakeReader::default().with("a.tif", vec![vec![Some(7.0); 4]]);

        RenderWorkerPool::new(2, move || reader.clone()).unwrap()
    }

    #[tokio::test]
    async fn renders_on_worker_threads() {
        let pool = pool();

        let rendered = pool
            .render_tile(TileRequest {
                bbox: Rect::new((0.0, 0.0), (1.0, 1.0)),
                tile_size: 2,
                format: None,
                pixel_selection: PixelSelection::First,
                assets: ["a.tif"].into(),
                options: ReaderOptions::default(),
            })
            .await
            .unwrap();

        assert_eq!(rendered.format, ImageFormat::Jpeg);

        let values = pool
            .query_point(PointRequest {
                lon: 0.0,
                lat: 0.0,
                assets: ["a.tif"].into(),
                options: ReaderOptions::default(),
            })
            .await
            .unwrap();

        assert_eq!(values[0].values, vec![7.0]);

        pool.shutdown();
    }

    #[tokio::test]
    async fn closed_pool_rejects_requests() {
        let pool = pool();

        pool.shutdown();

        let result = pool
            .query_point(PointRequest {
                lon: 0.0,
                lat: 0.0,
                assets: ["a.tif"].into(),
                options: ReaderOptions::default(),
            })
            .await;

        assert!(matches!(result, Err(ReError::QueueClosed)));
    }
}
