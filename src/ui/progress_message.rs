/// Events sent from analysis workers to the progress display
#[derive(Clone, Debug)]
pub enum ProgressMessage {
    Analysed { file: String },
    Failed { file: String, error: String },
    Finished,
}
