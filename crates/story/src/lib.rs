pub mod layer_tree;
