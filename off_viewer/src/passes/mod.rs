pub mod mesh_render_pass;
