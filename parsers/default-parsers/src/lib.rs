macros::include_parsers!(blaze, flashgraph, graphene);
