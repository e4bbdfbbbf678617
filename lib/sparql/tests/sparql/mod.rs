mod queries;
mod updates;
