/// Events the pipeline reports while a sync runs.
#[derive(Clone, Debug, PartialEq)]
pub enum ProgressMessage {
    Started {
        chunks: usize,
        ids: usize,
    },
    ChunkFetched {
        chunk: usize,
        fetched: usize,
        missing: usize,
    },
    ChunkCommitted {
        chunk: usize,
        rows: usize,
    },
    PersonSkipped {
        id: u32,
        error: String,
    },
    Finished,
}
