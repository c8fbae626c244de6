/// File system tools - batch reads, single-file writes, deletes and
/// project scaffolding.
pub mod delete;
pub mod init_project;
pub mod project_structure;
pub mod read_files;
pub mod write_file;

pub use delete::DeletePathTool;
pub use init_project::InitProjectTool;
pub use project_structure::ProjectStructureTool;
pub use read_files::ReadFilesTool;
pub use write_file::WriteFileTool;
