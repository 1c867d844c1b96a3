use courseflow::{FlowGraph, MemoryStore, Planner, StaticCatalog};

const CATALOG: &str = r#"[
    {"courseNumber": "CS101", "info": {"title": "Introduction to Programming", "units": 4}},
    {"courseNumber": "CS201", "prerequisites": ["CS101"], "info": {"title": "Data Structures", "units": 4}},
    {"courseNumber": "CS202", "prerequisites": ["CS101"], "info": {"title": "Computer Organization", "units": 4}},
    {"courseNumber": "MATH110", "info": {"title": "Discrete Mathematics", "units": 4}},
    {"courseNumber": "CS301", "prerequisites": ["CS201", "CS202", "MATH110"], "info": {"title": "Algorithms", "units": 4}}
]"#;

fn print(flow: &FlowGraph) {
    for node in flow.nodes() {
        println!(
            "  {:<8} {:<13} ({:>7.1}, {:>6.1})",
            node.id.as_str(),
            node.state.to_string(),
            node.position.x,
            node.position.y
        );
    }
}

fn main() -> anyhow::Result<()> {
    courseflow::init_logging()?;

    let runtime = tokio::runtime::Builder::new_current_thread().build()?;

    runtime.block_on(async {
        let catalog = StaticCatalog::from_json(CATALOG)?;
        let mut planner = Planner::new(catalog).with_store(MemoryStore::new("demo"));
        let mut flow = FlowGraph::new();

        planner.insert_course(&mut flow, "CS301", false).await?;
        let import = planner.insert_prerequisite_subtree(&mut flow, "CS301").await;
        println!("imported {:?}", import.into_result()?);
        print(&flow);

        planner.insert_prerequisite_subtree(&mut flow, "CS201").await.into_result()?;
        planner.set_taken(&mut flow, "CS101", true).await?;
        planner.set_taken(&mut flow, "CS201", true).await?;
        planner.set_taken(&mut flow, "CS202", true).await?;
        planner.set_taken(&mut flow, "MATH110", true).await?;
        println!("after marking the lower division as taken:");
        print(&flow);

        planner.undo(&mut flow).await?;
        println!("after undo:");
        print(&flow);

        println!("saved flow: {}", serde_json::to_string_pretty(&flow)?);

        Ok::<_, anyhow::Error>(())
    })
}
