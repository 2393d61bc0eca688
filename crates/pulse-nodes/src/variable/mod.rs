//! Variable nodes
//!
//! Access to graph variables, shared by every pulse over the same graph.

mod get_variable;
mod set_variable;

pub use get_variable::GetVariableNode;
pub use set_variable::SetVariableNode;

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::output::CollectingPrintSink;
    use crate::test_utils::print_extensions;
    use pulse_engine::{DataType, EngineError, GraphBuilder, NodeRegistry, Pulse, Value};

    fn accumulate_graph() -> pulse_engine::BuiltGraph {
        // total = total + 5, then print the new value
        GraphBuilder::new(Arc::new(NodeRegistry::with_builtins()))
            .add_node("get", "GetVariable<Int>")
            .with_property("Name", "total")
            .add_node("five", "Constant<Int>")
            .with_property("Value", 5)
            .add_node("add", "Add<Int>")
            .add_node("set", "SetVariable<Int>")
            .with_property("Name", "total")
            .add_node("print", "Print")
            .value("get", "Value", "add", "A")
            .value("five", "Value", "add", "B")
            .value("add", "Sum", "set", "Value")
            .flow("set", "Out", "print", "In")
            .value("set", "Value", "print", "Value")
            .variable("total", DataType::Int, true)
            .initial(1)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_writes_persist_across_pulses() {
        let built = accumulate_graph();
        let set = built.id("set").unwrap();
        let sink = Arc::new(CollectingPrintSink::new());

        for _ in 0..2 {
            Pulse::new(&built.graph)
                .with_extensions(print_extensions(sink.clone()))
                .run(set, 0)
                .await
                .unwrap();
        }

        assert_eq!(sink.values(), vec![Value::Int(6), Value::Int(11)]);
        assert_eq!(built.graph.variable_value("total").unwrap(), Value::Int(11));
    }

    #[tokio::test]
    async fn test_loop_body_reads_its_own_writes() {
        // counter = counter + 1, three times in one pulse
        let built = GraphBuilder::new(Arc::new(NodeRegistry::with_builtins()))
            .add_node("three", "Constant<Int>")
            .with_property("Value", 3)
            .add_node("repeat", "Repeat")
            .add_node("get", "GetVariable<Int>")
            .with_property("Name", "counter")
            .add_node("one", "Constant<Int>")
            .with_property("Value", 1)
            .add_node("add", "Add<Int>")
            .add_node("set", "SetVariable<Int>")
            .with_property("Name", "counter")
            .add_node("print", "Print")
            .value("three", "Value", "repeat", "Count")
            .flow("repeat", "Iteration", "set", "In")
            .value("get", "Value", "add", "A")
            .value("one", "Value", "add", "B")
            .value("add", "Sum", "set", "Value")
            .flow("repeat", "Finished", "print", "In")
            .value("get", "Value", "print", "Value")
            .variable("counter", DataType::Int, false)
            .initial(0)
            .build()
            .unwrap();

        let sink = Arc::new(CollectingPrintSink::new());
        Pulse::new(&built.graph)
            .with_extensions(print_extensions(sink.clone()))
            .run(built.id("repeat").unwrap(), 0)
            .await
            .unwrap();

        assert_eq!(built.graph.variable_value("counter").unwrap(), Value::Int(3));
        assert_eq!(sink.values(), vec![Value::Int(3)]);
    }

    #[tokio::test]
    async fn test_unknown_variable_fails_pulse() {
        let mut built = accumulate_graph();
        let get = built.id("get").unwrap();
        built.graph.set_property(get, "Name", "missing").unwrap();

        let err = Pulse::new(&built.graph)
            .run(built.id("set").unwrap(), 0)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NodeProcess { node_id, .. } if node_id == get));
        assert_eq!(built.graph.variable_value("total").unwrap(), Value::Int(1));
    }
}
