mod decisions;
mod host;
mod object_graph;
